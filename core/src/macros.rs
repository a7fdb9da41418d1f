/// Collects markup values and children into the argument list of [`tag`](crate::tag).
///
/// Every argument is converted with [`Item::from`](crate::Item), so markup, markup lists,
/// class maps, keys, node refs, nodes and optional nodes can be mixed freely.
///
/// ```
/// use trellis_core::{Markup, markup, tag, text};
///
/// let done = true;
/// let node = tag(
///     "li",
///     markup![
///         Markup::class("completed", done)?,
///         text("buy milk"),
///         done.then(|| text(" (done)")),
///     ],
/// );
/// assert_eq!(node.as_element().map(|e| e.children().len()), Some(2));
/// # Ok::<(), trellis_core::ConstructionError>(())
/// ```
#[macro_export]
macro_rules! markup {
    () => {
        ::std::vec::Vec::<$crate::Item>::new()
    };
    ($($item:expr),+ $(,)?) => {
        ::std::vec![$($crate::Item::from($item)),+]
    };
}
