//! Closed vocabularies for enumerated pose fields
//!
//! Membership is tested case-insensitively against the canonical lower-case spelling.
//! Nothing else is folded: `forward-bend` is not `forward_bend`.

use serde::{Deserialize, Serialize};

/// A closed set of legal values for one enumerated column
pub trait Vocabulary: Sized + Copy + 'static {
    /// Column name the vocabulary applies to
    const FIELD: &'static str;

    /// Every legal value, in display order
    fn all() -> &'static [Self];

    /// Canonical spelling
    fn as_str(self) -> &'static str;

    /// Case-insensitive lookup; `None` for anything outside the set
    fn parse_label(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::all()
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(value))
    }

    /// Comma-separated list of legal values for error messages
    fn expected() -> String {
        Self::all()
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

macro_rules! closed_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl Vocabulary for $name {
            const FIELD: &'static str = $field;

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_vocabulary! {
    /// Pose difficulty
    Difficulty, "difficulty" {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

closed_vocabulary! {
    /// Publication status of a pose record
    PoseStatus, "status" {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
}

closed_vocabulary! {
    /// Body position family
    PoseType, "pose_type" {
        Standing => "standing",
        Seated => "seated",
        Supine => "supine",
        Prone => "prone",
        Kneeling => "kneeling",
        Inversion => "inversion",
        Balancing => "balancing",
        Backbend => "backbend",
        ForwardBend => "forward_bend",
        Twist => "twist",
        ArmBalance => "arm_balance",
        Restorative => "restorative",
    }
}

closed_vocabulary! {
    /// Focus area, shared by `primary_focus` and the multi-valued `secondary_focus`
    FocusArea, "primary_focus" {
        Strength => "strength",
        Flexibility => "flexibility",
        Balance => "balance",
        Relaxation => "relaxation",
        Core => "core",
        Hips => "hips",
        Hamstrings => "hamstrings",
        Shoulders => "shoulders",
        Back => "back",
        Chest => "chest",
        Legs => "legs",
        Arms => "arms",
        Breathing => "breathing",
    }
}
