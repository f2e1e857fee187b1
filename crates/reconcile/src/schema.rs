//! Target schema tables and field availability.
//!
//! Each target platform's bulk-upload format is described by two parallel
//! lists: target field names and the IDE field that feeds each one. Given the
//! header of a loaded IDE file, [`FieldMap::available`] yields the ordered
//! [`FieldSet`] of target columns the run can actually populate.

use crate::error::{Error, Result};
use ide::fields;

/// Mahara bulk-upload user columns.
pub const MAHARA_USER_FIELDS: &[&str] = &[
    "username",
    "remoteuser",
    "password",
    "email",
    "firstname",
    "lastname",
    "preferredname",
    "studentid",
    "introduction",
    "officialwebsite",
    "personalwebsite",
    "blogaddress",
    "address",
    "town",
    "city",
    "country",
    "homenumber",
    "businessnumber",
    "mobilenumber",
    "faxnumber",
    "icqnumber",
    "msnnumber",
    "aimscreenname",
    "yahoochat",
    "skypeusername",
    "jabberusername",
    "occupation",
    "industry",
];

/// IDE sources for [`MAHARA_USER_FIELDS`], position by position.
pub const MAHARA_SOURCE_FIELDS: &[&str] = &[
    fields::USERNAME,
    fields::SMS_PERSON_ID,
    fields::PASSWORD,
    fields::EMAIL,
    fields::FIRST_NAME,
    fields::LAST_NAME,
    "preferredname",
    fields::SMS_PERSON_ID,
    "introduction",
    "officialwebsite",
    "personalwebsite",
    "blogaddress",
    "address",
    "town",
    "city",
    "country",
    "homenumber",
    "businessnumber",
    "mobilenumber",
    "faxnumber",
    "icqnumber",
    "msnnumber",
    "aimscreenname",
    "yahoochat",
    "skypeusername",
    "jabberusername",
    "occupation",
    "industry",
];

/// Moodle bulk-upload user columns.
pub const MOODLE_USER_FIELDS: &[&str] = &[
    "username",
    "password",
    "firstname",
    "lastname",
    "email",
    "institution",
    "department",
    "city",
    "country",
    "lang",
    "auth",
    "ajax",
    "timezone",
    "idnumber",
    "icq",
    "phone1",
    "phone2",
    "address",
    "url",
    "description",
    "mailformat",
    "maildisplay",
    "htmleditor",
    "autosubscribe",
    "oldusername",
    "deleted",
];

/// IDE sources for [`MOODLE_USER_FIELDS`], position by position.
pub const MOODLE_SOURCE_FIELDS: &[&str] = &[
    fields::USERNAME,
    fields::PASSWORD,
    fields::FIRST_NAME,
    fields::LAST_NAME,
    fields::EMAIL,
    "institution",
    "department",
    "city",
    "country",
    "lang",
    "auth",
    "ajax",
    "timezone",
    fields::SMS_PERSON_ID,
    "icq",
    "phone1",
    "phone2",
    "address",
    "url",
    "description",
    "mailformat",
    "maildisplay",
    "htmleditor",
    "autosubscribe",
    "oldusername",
    fields::DELETED,
];

/// Target fields that may be populated without a source column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyntheticFields {
    /// A password option is active (default, generated or empty).
    pub password: bool,
    /// The delete marker option is active.
    pub deleted: bool,
}

/// Parallel target/source field tables for one target format.
#[derive(Debug, Clone)]
pub struct FieldMap {
    name: &'static str,
    pairs: Vec<(&'static str, &'static str)>,
}

impl FieldMap {
    /// Pair `targets` with `sources`. The lists must have the same length.
    pub fn new(
        name: &'static str,
        targets: &[&'static str],
        sources: &[&'static str],
    ) -> Result<Self> {
        if targets.len() != sources.len() {
            return Err(Error::config(format!(
                "{name} schema has {} target fields but {} source fields",
                targets.len(),
                sources.len()
            )));
        }

        Ok(Self {
            name,
            pairs: targets.iter().copied().zip(sources.iter().copied()).collect(),
        })
    }

    /// Mahara bulk-upload user table.
    pub fn mahara_users() -> Result<Self> {
        Self::new("mahara", MAHARA_USER_FIELDS, MAHARA_SOURCE_FIELDS)
    }

    /// Moodle bulk-upload user table.
    pub fn moodle_users() -> Result<Self> {
        Self::new("moodle", MOODLE_USER_FIELDS, MOODLE_SOURCE_FIELDS)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// IDE field feeding a target field.
    pub fn source_for(&self, target: &str) -> Option<&'static str> {
        self.pairs
            .iter()
            .find(|(t, _)| *t == target)
            .map(|(_, s)| *s)
    }

    /// Target fields populated by `header`, in table order.
    pub fn available(&self, header: &[String], synthetic: SyntheticFields) -> FieldSet {
        let present = |source: &str| {
            header.iter().any(|h| h == source)
                || (synthetic.password && source == fields::PASSWORD)
                || (synthetic.deleted && source == fields::DELETED)
        };

        let columns: Vec<_> = self
            .pairs
            .iter()
            .filter(|(_, source)| present(source))
            .copied()
            .collect();

        log::debug!(
            "{} columns: {}",
            self.name,
            columns
                .iter()
                .map(|(t, _)| *t)
                .collect::<Vec<_>>()
                .join(",")
        );

        FieldSet { columns }
    }
}

/// Ordered target fields a run will populate, with their IDE sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    columns: Vec<(&'static str, &'static str)>,
}

impl FieldSet {
    /// Target field names, in column order.
    pub fn targets(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(t, _)| *t).collect()
    }

    pub fn contains(&self, target: &str) -> bool {
        self.columns.iter().any(|(t, _)| *t == target)
    }

    /// `(target, source)` pairs, in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.columns.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
