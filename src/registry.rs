use std::any::{Any, TypeId};

use crate::app::{BuildContext, InjectContext};
use crate::error::Result;
use crate::holder::ControllerCell;

/// One declared capability of a controller type: identity plus the cast
/// from the concrete instance to the capability handle.
pub struct CapabilityVtable {
    pub id: fn() -> TypeId,
    pub name: fn() -> &'static str,
    pub cast: fn(&ControllerCell) -> Box<dyn Any>,
}

/// A capability required by a controller's constructor.
pub struct CapabilityRef {
    pub id: fn() -> TypeId,
    pub name: fn() -> &'static str,
}

/// Target of an explicit "construct after" constraint.
pub struct AfterRef {
    pub id: fn() -> TypeId,
    pub name: fn() -> &'static str,
}

/// Registration info for a controller type, collected via inventory.
/// Emitted by the `#[controller]` attribute; all fields are plain `fn`
/// pointers so the value is const-constructible.
pub struct Registration {
    pub type_name: fn() -> &'static str,
    pub type_id: fn() -> TypeId,
    /// At most one explicit predecessor; `None` means discovery order.
    pub after: Option<AfterRef>,
    pub capabilities: fn() -> &'static [CapabilityVtable],
    pub dependencies: fn() -> &'static [CapabilityRef],
    pub build: fn(&mut BuildContext<'_>) -> Result<ControllerCell>,
    pub inject: fn(&ControllerCell, &InjectContext<'_>) -> Result<()>,
}

inventory::collect!(Registration);

/// The discovery catalogue: every registration in the binary, sorted by
/// type name. Inventory iteration order depends on link order, so the sort
/// is what makes discovery order deterministic.
pub fn discover() -> Vec<&'static Registration> {
    let mut catalogue: Vec<&'static Registration> =
        inventory::iter::<Registration>.into_iter().collect();
    catalogue.sort_by_key(|registration| (registration.type_name)());
    catalogue
}

/// Look a registration up by concrete controller type.
pub(crate) fn find(type_id: TypeId) -> Option<&'static Registration> {
    inventory::iter::<Registration>
        .into_iter()
        .find(|registration| (registration.type_id)() == type_id)
}
