//! Header alias resolution.
//!
//! Uploads from different deployments name the same column differently
//! (`id`, `student_id`, `studentID`, ...). Headers are normalized before they
//! are compared against the alias table, so casing, surrounding whitespace,
//! separators and a leading UTF-8 byte order mark do not matter.

use csv::StringRecord;

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Id,
    Name,
    Percentage,
    Email,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 4] = [
        ColumnRole::Id,
        ColumnRole::Name,
        ColumnRole::Percentage,
        ColumnRole::Email,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Percentage => "percentage",
            Self::Email => "email",
        }
    }

    fn builtin_aliases(self) -> &'static [&'static str] {
        match self {
            Self::Id => &["id", "student_id", "studentid"],
            Self::Name => &["name", "student_name", "full_name", "student"],
            Self::Percentage => &["percentage", "percent", "score", "pct"],
            Self::Email => &["email", "email_address", "mail", "e-mail"],
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Id => 0,
            Self::Name => 1,
            Self::Percentage => 2,
            Self::Email => 3,
        }
    }
}

/// Normalized header aliases per column role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAliases {
    by_role: [Vec<String>; 4],
}

impl Default for ColumnAliases {
    fn default() -> Self {
        let mut aliases = Self {
            by_role: Default::default(),
        };
        for role in ColumnRole::ALL {
            aliases = aliases.with_extra(role, role.builtin_aliases());
        }
        aliases
    }
}

impl ColumnAliases {
    pub fn with_extra<I, S>(mut self, role: ColumnRole, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let slot = &mut self.by_role[role.slot()];
        for alias in extra {
            let normalized = normalize_header(alias.as_ref());
            if !normalized.is_empty() && !slot.contains(&normalized) {
                slot.push(normalized);
            }
        }
        self
    }

    pub fn aliases(&self, role: ColumnRole) -> &[String] {
        &self.by_role[role.slot()]
    }

    pub fn role_for(&self, header: &str) -> Option<ColumnRole> {
        let normalized = normalize_header(header);
        ColumnRole::ALL
            .into_iter()
            .find(|role| self.aliases(*role).contains(&normalized))
    }
}

pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Field positions of the required columns within a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub id: usize,
    pub name: usize,
    pub percentage: usize,
    pub email: usize,
}

impl ColumnMap {
    pub fn index(&self, role: ColumnRole) -> usize {
        match role {
            ColumnRole::Id => self.id,
            ColumnRole::Name => self.name,
            ColumnRole::Percentage => self.percentage,
            ColumnRole::Email => self.email,
        }
    }
}

/// Maps the header row onto the required columns. When several headers map to
/// the same role the leftmost one wins.
pub fn resolve_columns(
    headers: &StringRecord,
    aliases: &ColumnAliases,
) -> Result<ColumnMap, IngestError> {
    if headers.iter().all(|header| normalize_header(header).is_empty()) {
        return Err(IngestError::malformed("file has no header row"));
    }

    let mut positions: [Option<usize>; 4] = [None; 4];
    for (index, header) in headers.iter().enumerate() {
        if let Some(role) = aliases.role_for(header) {
            positions[role.slot()].get_or_insert(index);
        }
    }

    let missing: Vec<&str> = ColumnRole::ALL
        .into_iter()
        .filter(|role| positions[role.slot()].is_none())
        .map(ColumnRole::canonical_name)
        .collect();

    match positions {
        [Some(id), Some(name), Some(percentage), Some(email)] => Ok(ColumnMap {
            id,
            name,
            percentage,
            email,
        }),
        _ => Err(IngestError::malformed(format!(
            "missing required column(s): {} (found headers: {})",
            missing.join(", "),
            headers.iter().collect::<Vec<_>>().join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn normalizes_case_separators_and_bom() {
        assert_eq!(normalize_header("\u{feff} Student_ID "), "studentid");
        assert_eq!(normalize_header("E-Mail"), "email");
        assert_eq!(normalize_header("Full Name"), "fullname");
    }

    #[test]
    fn resolves_canonical_headers() {
        let map = resolve_columns(
            &headers(&["id", "name", "percentage", "email"]),
            &ColumnAliases::default(),
        )
        .expect("canonical headers should resolve");

        assert_eq!(
            map,
            ColumnMap {
                id: 0,
                name: 1,
                percentage: 2,
                email: 3
            }
        );
    }

    #[test]
    fn resolves_aliases_in_any_order() {
        let map = resolve_columns(
            &headers(&["Email", "studentID", "Score", "Student Name"]),
            &ColumnAliases::default(),
        )
        .expect("aliased headers should resolve");

        assert_eq!(map.index(ColumnRole::Id), 1);
        assert_eq!(map.index(ColumnRole::Name), 3);
        assert_eq!(map.index(ColumnRole::Percentage), 2);
        assert_eq!(map.index(ColumnRole::Email), 0);
    }

    #[test]
    fn leftmost_duplicate_role_wins() {
        let map = resolve_columns(
            &headers(&["student_id", "id", "name", "percentage", "email"]),
            &ColumnAliases::default(),
        )
        .expect("headers should resolve");
        assert_eq!(map.id, 0);
    }

    #[test]
    fn configured_aliases_extend_builtins() {
        let aliases =
            ColumnAliases::default().with_extra(ColumnRole::Percentage, ["Final Mark"]);
        let map = resolve_columns(&headers(&["id", "name", "final_mark", "email"]), &aliases)
            .expect("extra alias should resolve");
        assert_eq!(map.percentage, 2);
        assert!(aliases
            .aliases(ColumnRole::Percentage)
            .contains(&"percentage".to_string()));
    }

    #[test]
    fn reports_every_missing_column() {
        let error = resolve_columns(&headers(&["id", "name"]), &ColumnAliases::default())
            .expect_err("missing columns should fail");

        match error {
            IngestError::MalformedInput(message) => {
                assert!(message.contains("percentage, email"));
                assert!(message.contains("found headers: id, name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bare_student_header_names_the_student() {
        let map = resolve_columns(
            &headers(&["Student", "Student ID", "Percentage", "Email"]),
            &ColumnAliases::default(),
        )
        .expect("headers should resolve");

        assert_eq!(map.name, 0);
        assert_eq!(map.id, 1);
        assert_eq!(map.percentage, 2);
        assert_eq!(map.email, 3);
    }

    #[test]
    fn rejects_blank_header_row() {
        let error = resolve_columns(&headers(&["", " "]), &ColumnAliases::default())
            .expect_err("blank headers should fail");
        assert_eq!(error, IngestError::malformed("file has no header row"));
    }
}
