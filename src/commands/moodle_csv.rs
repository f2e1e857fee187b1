//! Moodle bulk-upload CSV output

use anyhow::Result;
use reconcile::sink::{MoodleCsvOptions, MoodleCsvSink};
use reconcile::{
    FieldMap, GroupExtractor, PasswordPolicy, PrivilegePattern, Sink, SyntheticFields,
};

use crate::Context;
use crate::cli::MoodleCsvArgs;
use crate::commands::{load_csv_input, offline_changes, require};
use crate::config::expand_path;
use crate::{report, ui};

pub fn run(ctx: &Context, args: MoodleCsvArgs) -> Result<()> {
    let domain = require(
        args.input.domain.as_deref(),
        ctx.config.domain.as_deref(),
        "school domain",
    )?;
    // Moodle has no group admin column; the option is still required so both
    // CSV outputs accept the same invocation.
    require(
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
        empty: args.emptypassword,
    };
    let fields = FieldMap::moodle_users()?.available(
        &file.header,
        SyntheticFields {
            password: passwords.is_active(),
            deleted: args.delete,
        },
    );

    let changes = offline_changes(&file, &domain, passwords, PrivilegePattern::TEACH)?;
    if !ctx.quiet {
        ui::header("Moodle CSV export");
        report::changes(&changes);
    }

    let mut sink = MoodleCsvSink::new(
        fields,
        GroupExtractor::new(PrivilegePattern::TEACH),
        MoodleCsvOptions {
            output_dir: expand_path(&args.output_dir.to_string_lossy()),
            users: args.users,
            courses: args.courses,
            enrol: args.enrol,
            mark_deleted: args.delete,
        },
    );
    let summary = sink.emit(&changes)?;
    log::info!("finished");

    if !ctx.quiet {
        report::emitted(&summary);
    }
    Ok(())
}
