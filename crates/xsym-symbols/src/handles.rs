//! Metadata row handles.
//!
//! Every definition loaded from (or emitted to) metadata occupies one row in
//! one table. Handles are 1-based row numbers; row 0 is never valid.

use std::fmt;

/// Metadata tables that hold definitions tracked by edit-and-continue.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableIndex {
    TypeDef,
    Field,
    MethodDef,
    Param,
    Event,
    Property,
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $table:expr) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub const TABLE: TableIndex = $table;

            pub const fn row(self) -> u32 {
                self.0
            }

            pub const fn is_nil(self) -> bool {
                self.0 == 0
            }
        }

        impl From<$name> for EntityHandle {
            fn from(handle: $name) -> Self {
                EntityHandle {
                    table: $table,
                    row: handle.0,
                }
            }
        }
    };
}

define_handle!(
    /// Row in the `TypeDef` table.
    TypeDefinitionHandle,
    TableIndex::TypeDef
);
define_handle!(
    /// Row in the `Field` table.
    FieldDefinitionHandle,
    TableIndex::Field
);
define_handle!(
    /// Row in the `MethodDef` table.
    MethodDefinitionHandle,
    TableIndex::MethodDef
);
define_handle!(
    /// Row in the `Param` table.
    ParameterHandle,
    TableIndex::Param
);
define_handle!(
    /// Row in the `Event` table.
    EventDefinitionHandle,
    TableIndex::Event
);
define_handle!(
    /// Row in the `Property` table.
    PropertyDefinitionHandle,
    TableIndex::Property
);

/// A row in any definition table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle {
    pub table: TableIndex,
    pub row: u32,
}

impl EntityHandle {
    pub const fn type_definition(self) -> Option<TypeDefinitionHandle> {
        match self.table {
            TableIndex::TypeDef => Some(TypeDefinitionHandle(self.row)),
            _ => None,
        }
    }

    pub const fn method_definition(self) -> Option<MethodDefinitionHandle> {
        match self.table {
            TableIndex::MethodDef => Some(MethodDefinitionHandle(self.row)),
            _ => None,
        }
    }

    pub const fn field_definition(self) -> Option<FieldDefinitionHandle> {
        match self.table {
            TableIndex::Field => Some(FieldDefinitionHandle(self.row)),
            _ => None,
        }
    }

    pub const fn property_definition(self) -> Option<PropertyDefinitionHandle> {
        match self.table {
            TableIndex::Property => Some(PropertyDefinitionHandle(self.row)),
            _ => None,
        }
    }

    pub const fn event_definition(self) -> Option<EventDefinitionHandle> {
        match self.table {
            TableIndex::Event => Some(EventDefinitionHandle(self.row)),
            _ => None,
        }
    }

    /// Metadata token: table number in the high byte, row in the low 24 bits.
    pub const fn token(self) -> u32 {
        let table: u32 = match self.table {
            TableIndex::TypeDef => 0x02,
            TableIndex::Field => 0x04,
            TableIndex::MethodDef => 0x06,
            TableIndex::Param => 0x08,
            TableIndex::Event => 0x14,
            TableIndex::Property => 0x17,
        };
        (table << 24) | (self.row & 0x00FF_FFFF)
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.token())
    }
}
