/// Declare a typed wrapper over a [`GroupNode`](crate::node::GroupNode) of one
/// NeXus base class.
///
/// ```ignore
/// nx_class! {
///     /// Sample under study
///     pub struct NxSample: "NXsample" {
///         fields {
///             name: NxChar => "name",
///             temperature: NxFloat => "temperature" units "NX_TEMPERATURE",
///         }
///         attributes {}
///         groups {
///             beam: NxBeam => "beam",
///         }
///     }
/// }
/// ```
///
/// Each field `f` gets `f()`, `f_scalar()`, `set_f()` and `set_f_scalar()`.
/// Each group attribute `a` gets `a_attr()` and `set_a_attr()`. Each child
/// group `g` gets `g()`, `g_mut()`, `g_named()`, `g_named_mut()`, `all_g()`,
/// `set_g()`, `set_g_named()` and `set_all_g()`.
#[macro_export]
macro_rules! nx_class {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $nx:literal {
            fields {
                $(
                    $(#[$fmeta:meta])*
                    $field:ident : $ftype:ident => $fname:literal
                    $(units $funits:literal)?
                    $(one_of [$($fchoice:literal),* $(,)?])?
                ),* $(,)?
            }
            attributes {
                $(
                    $attr:ident : $atype:ident => $aname:literal
                    $(one_of [$($achoice:literal),* $(,)?])?
                ),* $(,)?
            }
            groups {
                $(
                    $group:ident : $gtype:ident => $gname:literal
                ),* $(,)?
            }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name<G = $crate::node::GroupNode> {
            group: G,
        }

        impl $name<$crate::node::GroupNode> {
            pub const NX_CLASS: &'static str = $nx;

            /// A new, empty group of this class.
            pub fn new() -> Self {
                $name {
                    group: $crate::node::GroupNode::new($nx),
                }
            }

            /// Every declared field, group attribute and child group.
            #[allow(unused_mut)]
            pub fn class_definition() -> $crate::schema::ClassDefinition {
                let mut def = $crate::schema::ClassDefinition::default();
                $(
                    def.fields.insert(
                        $fname.to_string(),
                        $crate::schema::FieldDefinition::new(
                            <$crate::value::$ftype as $crate::value::NxType>::FIELD_TYPE,
                        )
                        $(.with_units($funits))?
                        $(.with_enum(&[$($fchoice),*]))?,
                    );
                )*
                $(
                    def.attributes.insert(
                        $aname.to_string(),
                        $crate::schema::AttributeDefinition::new(
                            <$crate::value::$atype as $crate::value::NxType>::FIELD_TYPE,
                        )
                        $(.with_enum(&[$($achoice),*]))?,
                    );
                )*
                $(
                    def.groups.insert(
                        $gname.to_string(),
                        $crate::schema::GroupDefinition::new($gtype::<$crate::node::GroupNode>::NX_CLASS),
                    );
                )*
                def
            }
        }

        impl Default for $name<$crate::node::GroupNode> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<$name<$crate::node::GroupNode>> for $crate::node::Node {
            fn from(wrapper: $name<$crate::node::GroupNode>) -> Self {
                $crate::node::Node::Group(wrapper.group)
            }
        }

        impl<G> $crate::object::BaseClass<G> for $name<G> {
            const NX_CLASS: &'static str = $nx;

            fn wrap(group: G) -> Self {
                $name { group }
            }

            fn into_inner(self) -> G {
                self.group
            }
        }

        impl<G: ::std::borrow::Borrow<$crate::node::GroupNode>> $crate::object::NxObject for $name<G> {
            fn node(&self) -> &$crate::node::GroupNode {
                <G as ::std::borrow::Borrow<$crate::node::GroupNode>>::borrow(&self.group)
            }
        }

        impl<G: ::std::borrow::BorrowMut<$crate::node::GroupNode>> $crate::object::NxObjectMut for $name<G> {
            fn node_mut(&mut self) -> &mut $crate::node::GroupNode {
                <G as ::std::borrow::BorrowMut<$crate::node::GroupNode>>::borrow_mut(&mut self.group)
            }
        }

        $crate::paste::paste! {
            impl<G: ::std::borrow::Borrow<$crate::node::GroupNode>> $name<G> {
                $(
                    $(#[$fmeta])*
                    pub fn $field(&self) -> Option<&$crate::node::DatasetNode> {
                        $crate::object::NxObject::get_dataset(self, $fname)
                    }

                    pub fn [<$field _scalar>](
                        &self,
                    ) -> $crate::Result<Option<<$crate::value::$ftype as $crate::value::NxType>::Native>> {
                        $crate::object::NxObject::get_scalar::<$crate::value::$ftype>(self, $fname)
                    }
                )*

                $(
                    pub fn [<$attr _attr>](
                        &self,
                    ) -> $crate::Result<Option<<$crate::value::$atype as $crate::value::NxType>::Native>> {
                        $crate::object::NxObject::get_attr_scalar::<$crate::value::$atype>(self, None, $aname)
                    }
                )*

                $(
                    pub fn $group(&self) -> Option<$gtype<&$crate::node::GroupNode>> {
                        $crate::object::NxObject::get_child(self, $gname)
                    }

                    pub fn [<$group _named>](&self, name: &str) -> Option<$gtype<&$crate::node::GroupNode>> {
                        $crate::object::NxObject::get_child(self, name)
                    }

                    pub fn [<all_ $group>](
                        &self,
                    ) -> ::std::collections::BTreeMap<&str, $gtype<&$crate::node::GroupNode>> {
                        $crate::object::NxObject::get_children(self)
                    }
                )*
            }

            impl<G: ::std::borrow::BorrowMut<$crate::node::GroupNode>> $name<G> {
                $(
                    pub fn [<set_ $field>](
                        &mut self,
                        value: impl Into<$crate::value::Value>,
                    ) -> $crate::Result<&mut $crate::node::DatasetNode> {
                        $crate::object::NxObjectMut::set_value(self, $fname, value)
                    }

                    pub fn [<set_ $field _scalar>](
                        &mut self,
                        value: <$crate::value::$ftype as $crate::value::NxType>::Native,
                    ) -> $crate::Result<&mut $crate::node::DatasetNode> {
                        $crate::object::NxObjectMut::set_scalar::<$crate::value::$ftype>(self, $fname, value)
                    }
                )*

                $(
                    pub fn [<set_ $attr _attr>](
                        &mut self,
                        value: <$crate::value::$atype as $crate::value::NxType>::Native,
                    ) -> $crate::Result<()> {
                        let value = <$crate::value::$atype as $crate::value::NxType>::into_value(value);
                        $crate::object::NxObjectMut::set_attr(self, None, $aname, value)
                    }
                )*

                $(
                    pub fn [<$group _mut>](&mut self) -> Option<$gtype<&mut $crate::node::GroupNode>> {
                        $crate::object::NxObjectMut::get_child_mut(self, $gname)
                    }

                    pub fn [<$group _named_mut>](
                        &mut self,
                        name: &str,
                    ) -> Option<$gtype<&mut $crate::node::GroupNode>> {
                        $crate::object::NxObjectMut::get_child_mut(self, name)
                    }

                    pub fn [<set_ $group>](&mut self, child: $gtype) -> $crate::Result<()> {
                        $crate::object::NxObjectMut::put_child(self, $gname, child)
                    }

                    pub fn [<set_ $group _named>](&mut self, name: &str, child: $gtype) -> $crate::Result<()> {
                        $crate::object::NxObjectMut::put_child(self, name, child)
                    }

                    pub fn [<set_all_ $group>]<I>(&mut self, children: I) -> $crate::Result<()>
                    where
                        I: IntoIterator<Item = (String, $gtype)>,
                    {
                        $crate::object::NxObjectMut::set_children(self, children)
                    }
                )*
            }
        }
    };
}
