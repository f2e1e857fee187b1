//! Mahara bulk-upload CSV output

use anyhow::Result;
use reconcile::sink::{MaharaCsvOptions, MaharaCsvSink};
use reconcile::{FieldMap, PasswordPolicy, PrivilegePattern, Sink, SyntheticFields};

use crate::Context;
use crate::cli::MaharaCsvArgs;
use crate::commands::{load_csv_input, offline_changes, require};
use crate::config::expand_path;
use crate::{report, ui};

pub fn run(ctx: &Context, args: MaharaCsvArgs) -> Result<()> {
    let domain = require(
        args.input.domain.as_deref(),
        ctx.config.domain.as_deref(),
        "school domain",
    )?;
    let admin = require(
        args.admin.as_deref(),
        ctx.config.admin.as_deref(),
        "group default admin",
    )?;

    let Some(file) = load_csv_input(&args.input.file)? else {
        ui::info("CSV file is empty, nothing to write");
        return Ok(());
    };

    let passwords = PasswordPolicy {
        default: args.input.password.or_else(|| ctx.config.password.clone()),
        generate: args.genpassword,
        empty: false,
    };
    let fields = FieldMap::mahara_users()?.available(
        &file.header,
        SyntheticFields {
            password: passwords.is_active(),
            deleted: false,
        },
    );

    let changes = offline_changes(&file, &domain, passwords, PrivilegePattern::TEACH)?;
    if !ctx.quiet {
        ui::header("Mahara CSV export");
        report::changes(&changes);
    }

    let mut sink = MaharaCsvSink::new(
        fields,
        MaharaCsvOptions {
            output_dir: expand_path(&args.output_dir.to_string_lossy()),
            users: args.users,
            groups: args.groups,
            admin,
        },
    );
    let summary = sink.emit(&changes)?;
    log::info!("finished");

    if !ctx.quiet {
        report::emitted(&summary);
    }
    Ok(())
}
