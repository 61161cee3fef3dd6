#![forbid(unsafe_code)]

//! Explicit type registry for polymorphic decoding.
//!
//! Each entry maps a [`TypeTag`] to a constructor producing an empty instance
//! plus the XML element name used for that type. Nothing is discovered at
//! runtime: a type that was never registered cannot be decoded.
//!
//! ```
//! use pagedo_codec::CommandRegistry;
//! use pagedo_core::SetFieldCmd;
//! # use pagedo_core::{CommandError, FieldAccess, FieldValue};
//! # #[derive(Default)]
//! # struct Doc;
//! # impl FieldAccess for Doc {
//! #     fn read_field(&self, name: &str) -> Result<FieldValue, CommandError> {
//! #         Err(CommandError::UnknownField(name.into()))
//! #     }
//! #     fn apply_field(&mut self, name: &str, _: FieldValue) -> Result<(), CommandError> {
//! #         Err(CommandError::UnknownField(name.into()))
//! #     }
//! # }
//!
//! let mut registry = CommandRegistry::<Doc>::new();
//! registry.register::<SetFieldCmd>();
//! assert_eq!(registry.len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;

use pagedo_core::{Command, CommandType, TypeTag};

use crate::error::CodecError;

type Constructor<C> = fn() -> Box<dyn Command<C>>;

struct Entry<C> {
    construct: Constructor<C>,
    element: String,
}

impl<C> Clone for Entry<C> {
    fn clone(&self) -> Self {
        Self {
            construct: self.construct,
            element: self.element.clone(),
        }
    }
}

fn construct_default<C, T>() -> Box<dyn Command<C>>
where
    T: Command<C> + Default + 'static,
{
    Box::new(T::default())
}

/// Registered command types for context `C`.
pub struct CommandRegistry<C> {
    by_tag: HashMap<TypeTag, Entry<C>>,
    by_element: HashMap<String, TypeTag>,
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self {
            by_tag: HashMap::new(),
            by_element: HashMap::new(),
        }
    }
}

impl<C> Clone for CommandRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            by_tag: self.by_tag.clone(),
            by_element: self.by_element.clone(),
        }
    }
}

impl<C> fmt::Debug for CommandRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.by_tag.keys().map(ToString::to_string).collect();
        tags.sort_unstable();
        f.debug_struct("CommandRegistry").field("types", &tags).finish()
    }
}

impl<C: 'static> CommandRegistry<C> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`, using its type name as the XML element name.
    ///
    /// # Panics
    ///
    /// See [`register_as`](Self::register_as).
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: Command<C> + CommandType + Default + 'static,
    {
        let element = T::TYPE_TAG.name().to_owned();
        self.register_as::<T>(element)
    }

    /// Register `T` under an explicit XML element name.
    ///
    /// Registering the same type again replaces its element name.
    ///
    /// # Panics
    ///
    /// Panics if `element` is not a plain XML name or is already taken by a
    /// different type. Both are programming errors in registry setup.
    pub fn register_as<T>(&mut self, element: impl Into<String>) -> &mut Self
    where
        T: Command<C> + CommandType + Default + 'static,
    {
        let element = element.into();
        let tag = T::TYPE_TAG;
        assert!(
            is_xml_name(&element),
            "`{element}` is not a usable XML element name for `{tag}`"
        );
        if let Some(existing) = self.by_element.get(&element) {
            assert!(
                *existing == tag,
                "XML element `{element}` is already registered for `{existing}`"
            );
        }
        if let Some(previous) = self.by_tag.get(&tag) {
            self.by_element.remove(&previous.element);
        }
        self.by_element.insert(element.clone(), tag.clone());
        self.by_tag.insert(
            tag,
            Entry {
                construct: construct_default::<C, T>,
                element,
            },
        );
        self
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with<T>(mut self) -> Self
    where
        T: Command<C> + CommandType + Default + 'static,
    {
        self.register::<T>();
        self
    }

    /// Build an empty instance of the type identified by `tag`.
    pub fn construct(&self, tag: &TypeTag) -> Result<Box<dyn Command<C>>, CodecError> {
        self.by_tag
            .get(tag)
            .map(|entry| (entry.construct)())
            .ok_or_else(|| CodecError::TypeResolution {
                tag: tag.to_string(),
            })
    }

    /// XML element name registered for `tag`.
    pub fn element_for(&self, tag: &TypeTag) -> Result<&str, CodecError> {
        self.by_tag
            .get(tag)
            .map(|entry| entry.element.as_str())
            .ok_or_else(|| CodecError::TypeResolution {
                tag: tag.to_string(),
            })
    }

    /// Type tag registered under an XML element name.
    pub fn tag_for_element(&self, element: &str) -> Result<&TypeTag, CodecError> {
        self.by_element
            .get(element)
            .ok_or_else(|| CodecError::TypeResolution {
                tag: element.to_owned(),
            })
    }
}

impl<C> CommandRegistry<C> {
    /// Whether `tag` is registered.
    #[must_use]
    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.by_tag.contains_key(tag)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Registered tags, in no particular order.
    pub fn tags(&self) -> impl Iterator<Item = &TypeTag> {
        self.by_tag.keys()
    }
}

/// ASCII subset of the XML `Name` production, without namespaces.
pub(crate) fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !name.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("xml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagedo_core::SetFieldCmd;
    use pagedo_core::testing::{SetNumber, SetText, Sheet};

    fn registry() -> CommandRegistry<Sheet> {
        CommandRegistry::new()
            .with::<SetText>()
            .with::<SetNumber>()
            .with::<SetFieldCmd>()
    }

    #[test]
    fn construct_builds_registered_type() {
        let registry = registry();
        let cmd = registry.construct(&SetText::TYPE_TAG).unwrap();
        assert_eq!(cmd.type_tag(), SetText::TYPE_TAG);
        assert_eq!(cmd.downcast_ref::<SetText>(), Some(&SetText::default()));
    }

    #[test]
    fn unknown_tag_is_type_resolution_error() {
        let registry = registry();
        let tag = TypeTag::new("elsewhere", "Ghost");
        let err = registry.construct(&tag).unwrap_err();
        assert_eq!(
            err,
            CodecError::TypeResolution {
                tag: "elsewhere::Ghost".into()
            }
        );
        assert!(registry.element_for(&tag).unwrap_err().is_type_resolution());
    }

    #[test]
    fn element_names_default_to_type_name() {
        let registry = registry();
        assert_eq!(registry.element_for(&SetNumber::TYPE_TAG).unwrap(), "SetNumber");
        assert_eq!(
            registry.tag_for_element("SetFieldCmd").unwrap(),
            &SetFieldCmd::TYPE_TAG
        );
        assert!(registry.tag_for_element("Nope").is_err());
    }

    #[test]
    fn reregistering_replaces_element_name() {
        let mut registry = registry();
        registry.register_as::<SetText>("text-edit");
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.element_for(&SetText::TYPE_TAG).unwrap(), "text-edit");
        assert!(registry.tag_for_element("SetText").is_err());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_element_name_panics() {
        let mut registry = registry();
        registry.register_as::<SetNumber>("SetText");
    }

    #[test]
    #[should_panic(expected = "not a usable XML element name")]
    fn invalid_element_name_panics() {
        let mut registry = CommandRegistry::<Sheet>::new();
        registry.register_as::<SetText>("1st");
    }

    #[test]
    fn xml_name_rules() {
        assert!(is_xml_name("SetText"));
        assert!(is_xml_name("_a.b-c9"));
        assert!(!is_xml_name(""));
        assert!(!is_xml_name("9lives"));
        assert!(!is_xml_name("has space"));
        assert!(!is_xml_name("XmlThing"));
        assert!(!is_xml_name("a:b"));
    }

    #[test]
    fn debug_lists_sorted_tags() {
        let dbg = format!("{:?}", registry());
        assert!(dbg.contains("pagedo_core::SetFieldCmd"));
        assert!(dbg.find("SetFieldCmd") < dbg.find("testing::SetNumber"));
    }
}
