use std::fmt;
use std::sync::Arc;
use xsym_symbols::SymbolRef;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SemanticEditKind {
    Insert,
    Update,
    Delete,
}

/// Maps a position in the new source of an edited method to the position of
/// the same syntax in the previous source, if it existed there.
pub type SyntaxMap = Arc<dyn Fn(u32) -> Option<u32> + Send + Sync>;

/// One symbol-level difference between two generations, as reported by the
/// host.
#[derive(Clone)]
pub struct SemanticEdit {
    pub kind: SemanticEditKind,
    pub old_symbol: Option<SymbolRef>,
    pub new_symbol: Option<SymbolRef>,
    pub syntax_map: Option<SyntaxMap>,
    /// Keep the previous generation's local slots. Without it the edited
    /// method gets fresh locals.
    pub preserve_local_variables: bool,
}

impl SemanticEdit {
    pub fn insert(new_symbol: SymbolRef) -> Self {
        Self {
            kind: SemanticEditKind::Insert,
            old_symbol: None,
            new_symbol: Some(new_symbol),
            syntax_map: None,
            preserve_local_variables: false,
        }
    }

    pub fn update(old_symbol: SymbolRef, new_symbol: SymbolRef) -> Self {
        Self {
            kind: SemanticEditKind::Update,
            old_symbol: Some(old_symbol),
            new_symbol: Some(new_symbol),
            syntax_map: None,
            preserve_local_variables: false,
        }
    }

    /// An update whose locals are matched to the previous generation's
    /// through `syntax_map`.
    pub fn update_preserving_locals(
        old_symbol: SymbolRef,
        new_symbol: SymbolRef,
        syntax_map: SyntaxMap,
    ) -> Self {
        Self {
            syntax_map: Some(syntax_map),
            preserve_local_variables: true,
            ..Self::update(old_symbol, new_symbol)
        }
    }

    pub fn delete(old_symbol: SymbolRef) -> Self {
        Self {
            kind: SemanticEditKind::Delete,
            old_symbol: Some(old_symbol),
            new_symbol: None,
            syntax_map: None,
            preserve_local_variables: false,
        }
    }
}

impl fmt::Debug for SemanticEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticEdit")
            .field("kind", &self.kind)
            .field("old_symbol", &self.old_symbol.as_ref().map(ToString::to_string))
            .field("new_symbol", &self.new_symbol.as_ref().map(ToString::to_string))
            .field("has_syntax_map", &self.syntax_map.is_some())
            .field("preserve_local_variables", &self.preserve_local_variables)
            .finish()
    }
}
