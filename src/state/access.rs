//! Channel access hierarchy (voice < halfop < op < admin < owner).
//!
//! Levels are stored lowest first, so a level's index is its rank. Access
//! for a member is a string of mode letters (`"ov"`), and the member's
//! effective rank is the highest rank among those letters.

use crate::error::ModeError;

/// One rung of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLevel {
    pub name: String,
    pub mode_char: char,
    pub prefix: char,
    /// Name of the lowest level allowed to grant or revoke this one.
    pub min_level_to_set: String,
}

impl AccessLevel {
    pub fn new(name: &str, mode_char: char, prefix: char, min_level_to_set: &str) -> Self {
        Self {
            name: name.to_string(),
            mode_char,
            prefix,
            min_level_to_set: min_level_to_set.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessHierarchy {
    levels: Vec<AccessLevel>,
}

impl AccessHierarchy {
    /// Build from levels ordered lowest first.
    ///
    /// Fails when names or letters repeat, or when a level may be set by a
    /// level ranked below it.
    pub fn new(levels: Vec<AccessLevel>) -> Result<Self, ModeError> {
        for (rank, level) in levels.iter().enumerate() {
            if levels[..rank]
                .iter()
                .any(|l| l.name == level.name || l.mode_char == level.mode_char)
            {
                return Err(ModeError::InvalidHierarchy(format!(
                    "duplicate level {} ({})",
                    level.name, level.mode_char
                )));
            }
            match levels.iter().position(|l| l.name == level.min_level_to_set) {
                Some(setter) if setter >= rank => {}
                Some(_) => {
                    return Err(ModeError::InvalidHierarchy(format!(
                        "{} may be set by the lower level {}",
                        level.name, level.min_level_to_set
                    )));
                }
                None => return Err(ModeError::UnknownAccessLevel(level.min_level_to_set.clone())),
            }
        }
        Ok(Self { levels })
    }

    /// The five standard levels.
    pub fn standard() -> Result<Self, ModeError> {
        Self::new(vec![
            AccessLevel::new("voice", 'v', '+', "halfop"),
            AccessLevel::new("halfop", 'h', '%', "op"),
            AccessLevel::new("op", 'o', '@', "op"),
            AccessLevel::new("admin", 'a', '&', "owner"),
            AccessLevel::new("owner", 'q', '~', "owner"),
        ])
    }

    /// Rank of a level by name. Unknown names are a configuration bug.
    pub fn rank(&self, name: &str) -> Result<usize, ModeError> {
        self.levels
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| ModeError::UnknownAccessLevel(name.to_string()))
    }

    pub fn rank_of_char(&self, mode_char: char) -> Option<usize> {
        self.levels.iter().position(|l| l.mode_char == mode_char)
    }

    pub fn by_char(&self, mode_char: char) -> Option<&AccessLevel> {
        self.levels.iter().find(|l| l.mode_char == mode_char)
    }

    pub fn by_name(&self, name: &str) -> Option<&AccessLevel> {
        self.levels.iter().find(|l| l.name == name)
    }

    pub fn is_prefix_mode(&self, mode_char: char) -> bool {
        self.rank_of_char(mode_char).is_some()
    }

    /// Highest rank held by an access string, `None` for no access.
    pub fn highest_rank(&self, access: &str) -> Option<usize> {
        access.chars().filter_map(|c| self.rank_of_char(c)).max()
    }

    /// Whether an access string reaches the named level.
    pub fn is_at_least(&self, access: &str, required: &str) -> Result<bool, ModeError> {
        let required = self.rank(required)?;
        Ok(self.highest_rank(access).is_some_and(|rank| rank >= required))
    }

    /// Display glyph of the highest level held.
    pub fn prefix_glyph(&self, access: &str) -> Option<char> {
        self.highest_rank(access).map(|rank| self.levels[rank].prefix)
    }

    /// All glyphs held, highest first (multi-prefix form).
    pub fn all_prefix_glyphs(&self, access: &str) -> String {
        self.levels
            .iter()
            .rev()
            .filter(|l| access.contains(l.mode_char))
            .map(|l| l.prefix)
            .collect()
    }

    /// Reorder an access string highest rank first.
    pub fn normalize(&self, access: &str) -> String {
        self.levels
            .iter()
            .rev()
            .filter(|l| access.contains(l.mode_char))
            .map(|l| l.mode_char)
            .collect()
    }

    /// `PREFIX` ISUPPORT value, highest rank first: `(qaohv)~&@%+`.
    pub fn prefix_token(&self) -> String {
        let letters: String = self.levels.iter().rev().map(|l| l.mode_char).collect();
        let glyphs: String = self.levels.iter().rev().map(|l| l.prefix).collect();
        format!("({}){}", letters, glyphs)
    }

    pub fn levels(&self) -> &[AccessLevel] {
        &self.levels
    }
}

impl Default for AccessHierarchy {
    fn default() -> Self {
        Self::standard().expect("standard hierarchy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        let h = AccessHierarchy::standard().expect("standard hierarchy");
        assert_eq!(h.rank("voice"), Ok(0));
        assert_eq!(h.rank("owner"), Ok(4));
        assert_eq!(h.rank_of_char('o'), Some(2));
        assert_eq!(h.rank_of_char('x'), None);
    }

    #[test]
    fn test_unknown_level_is_an_error() {
        let h = AccessHierarchy::standard().expect("standard hierarchy");
        assert_eq!(
            h.rank("founder"),
            Err(ModeError::UnknownAccessLevel("founder".into()))
        );
        assert!(h.is_at_least("o", "founder").is_err());
    }

    #[test]
    fn test_access_monotonicity() {
        let h = AccessHierarchy::standard().expect("standard hierarchy");
        for (held_rank, held) in h.levels().iter().enumerate() {
            let access = held.mode_char.to_string();
            for (required_rank, required) in h.levels().iter().enumerate() {
                let expected = required_rank <= held_rank;
                assert_eq!(
                    h.is_at_least(&access, &required.name),
                    Ok(expected),
                    "{} vs {}",
                    held.name,
                    required.name
                );
            }
        }
    }

    #[test]
    fn test_no_access_is_below_everything() {
        let h = AccessHierarchy::standard().expect("standard hierarchy");
        assert_eq!(h.is_at_least("", "voice"), Ok(false));
    }

    #[test]
    fn test_highest_letter_wins() {
        let h = AccessHierarchy::standard().expect("standard hierarchy");
        assert_eq!(h.prefix_glyph("vo"), Some('@'));
        assert_eq!(h.all_prefix_glyphs("vo"), "@+");
        assert_eq!(h.normalize("vqh"), "qhv");
    }

    #[test]
    fn test_prefix_token() {
        assert_eq!(AccessHierarchy::standard().expect("standard hierarchy").prefix_token(), "(qaohv)~&@%+");
    }

    #[test]
    fn test_standard_table_passes_checks() {
        let h = AccessHierarchy::standard().expect("standard hierarchy");
        for level in h.levels() {
            assert!(h.rank(&level.min_level_to_set).expect("setter") >= h.rank(&level.name).expect("level"));
        }
    }

    #[test]
    fn test_rejects_escalating_setter() {
        let levels = vec![
            AccessLevel::new("voice", 'v', '+', "voice"),
            AccessLevel::new("op", 'o', '@', "voice"),
        ];
        assert!(matches!(
            AccessHierarchy::new(levels),
            Err(ModeError::InvalidHierarchy(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_letters() {
        let levels = vec![
            AccessLevel::new("voice", 'v', '+', "op"),
            AccessLevel::new("op", 'v', '@', "op"),
        ];
        assert!(AccessHierarchy::new(levels).is_err());
    }
}
