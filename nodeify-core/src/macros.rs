//! Declarative node definitions.

/// Declare the nodes of a graph type.
///
/// ```rust,ignore
/// pub struct Klass {
///     cells: Cells,
/// }
///
/// nodes! {
///     impl Klass(cells) in pub mod klass {
///         /// Defaults to 10.
///         pub x: i64 = |_this| Ok(10);
///         pub y: i64 = |_this| Ok(20);
///         pub a: i64 = |this| Ok(this.x()? + this.y()?);
///         pub label: String;
///     }
/// }
///
/// let mut k = Klass::builder()?.build(|cells| Klass { cells });
/// assert_eq!(k.a()?, 30);
/// klass::x.set(&mut k, 60)?;
/// assert_eq!(k.a()?, 80);
/// ```
///
/// For each node this generates:
///
/// - a getter method of the same name on the type,
/// - an [`Accessor`](crate::Accessor) constant of the same name in the given
///   module, used for `set`, `reset` and `state`,
/// - its entry in the [`Graph`](crate::Graph) impl, which is generated too.
///
/// Each computation body is captured with `stringify!` and analyzed at
/// registration: every `<receiver>.<name>` in it becomes a dependency.
/// A node without `= |receiver| body` is an input.
///
/// The accessor constants are in scope inside every body, so a local
/// binding named after a node (`let price = ..`) is read as a constant
/// pattern. Pick other names for locals.
#[macro_export]
macro_rules! nodes {
    (@accessors $graph:ident;) => {};
    (@accessors $graph:ident;
        $(#[$meta:meta])* $vis:vis $name:ident : $ty:ty = |$recv:ident| $body:expr;
        $($rest:tt)*
    ) => {
        #[doc(hidden)]
        pub mod $name {
            #[allow(unused_imports)]
            use super::*;

            pub fn compute($recv: &mut $graph) -> $crate::Result<$ty> {
                $body
            }
        }

        pub const $name: $crate::Accessor<$graph, $ty> =
            $crate::Accessor::new(stringify!($name), $name::compute);

        $crate::nodes!(@accessors $graph; $($rest)*);
    };
    (@accessors $graph:ident;
        $(#[$meta:meta])* $vis:vis $name:ident : $ty:ty;
        $($rest:tt)*
    ) => {
        pub const $name: $crate::Accessor<$graph, $ty> = $crate::Accessor::input(stringify!($name));

        $crate::nodes!(@accessors $graph; $($rest)*);
    };

    (@methods $graph:ident, $module:ident;) => {};
    (@methods $graph:ident, $module:ident;
        $(#[$meta:meta])* $vis:vis $name:ident : $ty:ty $(= |$recv:ident| $body:expr)?;
        $($rest:tt)*
    ) => {
        impl $graph {
            $(#[$meta])*
            $vis fn $name(&mut self) -> $crate::Result<$ty> {
                $module::$name.get(self)
            }
        }

        $crate::nodes!(@methods $graph, $module; $($rest)*);
    };

    (@declare $nodes:ident, $module:ident;) => {};
    (@declare $nodes:ident, $module:ident;
        $(#[$meta:meta])* $vis:vis $name:ident : $ty:ty = |$recv:ident| $body:expr;
        $($rest:tt)*
    ) => {
        $nodes.node(
            &$module::$name,
            $crate::Body::source(stringify!($recv), stringify!($body)),
        );

        $crate::nodes!(@declare $nodes, $module; $($rest)*);
    };
    (@declare $nodes:ident, $module:ident;
        $(#[$meta:meta])* $vis:vis $name:ident : $ty:ty;
        $($rest:tt)*
    ) => {
        $nodes.input(&$module::$name);

        $crate::nodes!(@declare $nodes, $module; $($rest)*);
    };

    (impl $graph:ident ($cells:ident) in $modvis:vis mod $module:ident {
        $($items:tt)*
    }) => {
        $modvis mod $module {
            #![allow(non_upper_case_globals)]

            #[allow(unused_imports)]
            use super::*;

            $crate::nodes!(@accessors $graph; $($items)*);
        }

        $crate::nodes!(@methods $graph, $module; $($items)*);

        impl $crate::Graph for $graph {
            fn declare(nodes: &mut $crate::SchemaBuilder<Self>) {
                $crate::nodes!(@declare nodes, $module; $($items)*);
            }

            fn cells(&self) -> &$crate::Cells {
                &self.$cells
            }

            fn cells_mut(&mut self) -> &mut $crate::Cells {
                &mut self.$cells
            }
        }
    };
}
