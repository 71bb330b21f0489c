use proc_macro::TokenStream;

mod gen;

/// Declarative controller registration.
///
/// ```ignore
/// #[conductor::controller(implements(Data, Init), after(AssetCache))]
/// #[derive(Default)]
/// struct DataController {
///     input: Dep<dyn Input>,       // injected after construction
///     panels: Views<PanelView>,    // every registered view of the type
/// }
/// ```
///
/// Arguments:
/// - `implements(TraitA, TraitB, ...)`: the capabilities this controller
///   is registered under.
/// - `after(OtherController)`: explicit construction-order constraint; at
///   most one per controller.
/// - `create(Shared<dyn Cap>, View<V>, Host, BuildContext)`: the
///   parameter list of `Self::new`, resolved in order at construction
///   time. `Shared<dyn Cap>` parameters are the ordering-relevant
///   constructor dependencies. Without `create(..)` the controller is
///   built via `Default`.
///
/// Fields typed `Dep<..>`, `Deps<..>`, `View<..>`, `Views<..>` or
/// `HostRef` are populated by the injection stage after every controller
/// has been constructed.
#[proc_macro_attribute]
pub fn controller(args: TokenStream, input: TokenStream) -> TokenStream {
    gen::controller_entry(args, input)
}
