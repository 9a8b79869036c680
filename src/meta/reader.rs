//! Reading metadata documents and attaching their descriptions.
//!
//! Each `rdf:Description` block names the entity it describes in its
//! `rdf:about` attribute. The reader maps that reference back to the archive,
//! an entry, or the metadata documents themselves, picks a payload kind and
//! attaches the description without duplicating an equal one.

use super::holder::Describable;
use super::object::{EntityId, MetaDataObject};
use crate::archive::constants::namespace;
use crate::archive::path::EntryPath;
use crate::common::xml::XmlElement;
use crate::common::{Error, ErrorLog, Result};

/// The entities a metadata document can refer to.
pub trait EntityTargets {
    /// Id of the live entry at the normalized `path`.
    fn entry_at(&self, path: &str) -> Option<EntityId>;

    /// Whether the normalized `path` is a known metadata document.
    fn is_metadata_file(&self, path: &str) -> bool;

    /// Mutable access to an entity.
    fn describable_mut(&mut self, id: EntityId) -> Option<&mut dyn Describable>;
}

/// A resolved `rdf:about` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AboutTarget {
    pub entity: EntityId,
    pub fragment: Option<String>,
}

/// Map an `about` value to an entity.
///
/// Entry paths may contain `#` themselves, so every split is tried: the
/// whole value first, then the value cut at each `#` from the right. The
/// part before the cut must match a live entry path exactly (then a metadata
/// document); the rest is the fragment. Values whose part before the first
/// `#` is `.`, `/` or empty name the archive. An empty fragment counts as
/// none.
pub fn resolve_about<T: EntityTargets + ?Sized>(targets: &T, about: &str) -> Option<AboutTarget> {
    let splits: Vec<(String, Option<String>)> = std::iter::once((about, None))
        .chain(
            about
                .rmatch_indices('#')
                .map(|(pos, _)| (&about[..pos], Some(&about[pos + 1..]))),
        )
        .map(|(path, fragment)| (EntryPath::normalize(path), fragment_of(fragment)))
        .collect();

    for (path, fragment) in &splits {
        if let Some(entity) = targets.entry_at(path) {
            return Some(AboutTarget {
                entity,
                fragment: fragment.clone(),
            });
        }
    }
    for (path, fragment) in &splits {
        if targets.is_metadata_file(path) {
            return Some(AboutTarget {
                entity: EntityId::MetaDataFile,
                fragment: fragment.clone(),
            });
        }
    }

    let (path, fragment) = match about.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (about, None),
    };
    if EntryPath::normalize(path) == "/" {
        return Some(AboutTarget {
            entity: EntityId::Archive,
            fragment: fragment_of(fragment),
        });
    }
    None
}

fn fragment_of(fragment: Option<&str>) -> Option<String> {
    fragment.filter(|f| !f.is_empty()).map(str::to_string)
}

/// The `about` value of a description block.
fn about_of(description: &XmlElement) -> Option<&str> {
    description
        .attribute(Some(namespace::RDF), "about")
        .or_else(|| description.attribute(None, "about"))
}

/// Read the metadata document `document` (named `name` in messages) and
/// attach its descriptions to `targets`.
///
/// Content errors go through `errors`: in strict mode the first one is
/// returned, in lenient mode the offending block is skipped. Returns the
/// number of descriptions that were newly attached.
pub fn read_metadata<T: EntityTargets + ?Sized>(
    name: &str,
    document: &str,
    targets: &mut T,
    errors: &mut ErrorLog,
) -> Result<usize> {
    let root = match XmlElement::parse(document) {
        Ok(root) => root,
        Err(e) => {
            errors.record(Error::XmlError(format!("cannot read metadata {}: {}", name, e)))?;
            return Ok(0);
        },
    };

    let mut added = 0;
    for (index, description) in root
        .descendants(Some(namespace::RDF), "Description")
        .into_iter()
        .enumerate()
    {
        let Some(about) = about_of(description) else {
            errors.record(Error::MissingAttribute {
                document: name.to_string(),
                element: "description",
                index,
                attribute: "about",
            })?;
            continue;
        };

        let Some(target) = resolve_about(targets, about) else {
            errors.record(Error::UnresolvedAbout {
                document: name.to_string(),
                index,
                about: about.to_string(),
            })?;
            continue;
        };

        let object = MetaDataObject::from_description(description);
        match targets.describable_mut(target.entity) {
            Some(entity) => {
                if entity.add_description(target.fragment.as_deref(), object) {
                    added += 1;
                } else {
                    log::debug!("skipping duplicate description of {}", about);
                }
            },
            None => log::warn!("could not attach description of {} in {}", about, name),
        }
    }

    log::debug!("attached {} descriptions from {}", added, name);
    Ok(added)
}

/// Attach every description of `document` to `entity`, whatever its
/// `about` says. Only the fragment of each reference is kept.
///
/// Returns the number of descriptions that were newly attached.
pub fn add_all_to_entity(document: &str, entity: &mut dyn Describable) -> Result<usize> {
    let root = XmlElement::parse(document)?;
    let mut added = 0;
    for description in root.descendants(Some(namespace::RDF), "Description") {
        let fragment = about_of(description)
            .and_then(|about| about.split_once('#'))
            .map(|(_, fragment)| fragment)
            .filter(|f| !f.is_empty());
        let object = MetaDataObject::from_description(description);
        if entity.add_description(fragment, object) {
            added += 1;
        }
    }
    Ok(added)
}
