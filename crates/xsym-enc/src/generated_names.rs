//! Names of compiler-generated state machine types and fields.
//!
//! Slot indices are encoded 1-based in the field name suffix (`__1` is slot
//! 0) so a later generation can recover them from metadata alone.

use crate::local_info::SynthesizedLocalKind;

/// The character that follows `<...>` in a generated name and tells what
/// the name stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeneratedNameKind {
    /// `<name>5__N`: a hoisted user-defined local.
    HoistedLocalField,
    /// `<>s__N`: a hoisted synthesized local.
    HoistedSynthesizedLocalField,
    /// `<>8__N`: a hoisted lambda display class instance.
    DisplayClassLocalOrField,
    /// `<>u__N`: an awaiter.
    AwaiterField,
    /// `<name>d__N`: a state machine type.
    StateMachineType,
}

impl GeneratedNameKind {
    const fn marker(self) -> char {
        match self {
            Self::HoistedLocalField => '5',
            Self::HoistedSynthesizedLocalField => 's',
            Self::DisplayClassLocalOrField => '8',
            Self::AwaiterField => 'u',
            Self::StateMachineType => 'd',
        }
    }

    fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '5' => Some(Self::HoistedLocalField),
            's' => Some(Self::HoistedSynthesizedLocalField),
            '8' => Some(Self::DisplayClassLocalOrField),
            'u' => Some(Self::AwaiterField),
            'd' => Some(Self::StateMachineType),
            _ => None,
        }
    }
}

pub fn make_hoisted_local_field_name(
    kind: SynthesizedLocalKind,
    slot_index: usize,
    local_name: Option<&str>,
) -> String {
    let number = slot_index + 1;
    match (kind, local_name) {
        (SynthesizedLocalKind::UserDefined, Some(name)) => format!(
            "<{name}>{}__{number}",
            GeneratedNameKind::HoistedLocalField.marker()
        ),
        (SynthesizedLocalKind::LambdaDisplayClass, _) => format!(
            "<>{}__{number}",
            GeneratedNameKind::DisplayClassLocalOrField.marker()
        ),
        _ => format!(
            "<>{}__{number}",
            GeneratedNameKind::HoistedSynthesizedLocalField.marker()
        ),
    }
}

pub fn make_awaiter_field_name(slot_index: usize) -> String {
    format!(
        "<>{}__{}",
        GeneratedNameKind::AwaiterField.marker(),
        slot_index + 1
    )
}

/// `<Method>d__{ordinal}`, suffixed with `#{generation}` for state machines
/// first emitted by an edit.
pub fn make_state_machine_type_name(
    method_name: &str,
    method_ordinal: u32,
    generation: u32,
) -> String {
    let mut name = format!(
        "<{method_name}>{}__{method_ordinal}",
        GeneratedNameKind::StateMachineType.marker()
    );
    if generation > 0 {
        name.push('#');
        name.push_str(&generation.to_string());
    }
    name
}

/// Splits a generated name into its kind and the 0-based slot index encoded
/// in its suffix.
pub fn try_parse_slot_index(name: &str) -> Option<(GeneratedNameKind, usize)> {
    let rest = name.strip_prefix('<')?;
    let close = rest.find('>')?;
    let mut tail = rest[close + 1..].chars();
    let kind = GeneratedNameKind::from_marker(tail.next()?)?;
    let digits = tail.as_str().strip_prefix("__")?;
    let digits = digits.split('#').next()?;
    let number: usize = digits.parse().ok()?;
    if number == 0 {
        return None;
    }
    Some((kind, number - 1))
}

#[cfg(test)]
#[path = "../tests/generated_names_tests.rs"]
mod tests;
