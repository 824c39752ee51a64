//! Item → index document transform.
//!
//! [`DocumentBuilder::build`] turns one parsed [`Item`] into an
//! [`IndexDocument`]: renamed scalar fields, one flattened text field per
//! sub-group and one [`ChildDocument`] per sub-group entry that has content.
//! The builder holds no state, so it can be shared freely across threads.
//!
//! Serialized, a document uses the nested update format of the search index,
//! with children listed under `_childDocuments_`:
//!
//! ```json
//! {
//!   "productId": "ABC123",
//!   "descriptions": "SHORT (EN): Brake Pad",
//!   "_childDocuments_": [
//!     { "type": "description - ABC123", "descriptionCode": "SHORT",
//!       "languageCode": "EN", "descriptionText": "Brake Pad" }
//!   ]
//! }
//! ```

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::warn;

use crate::model::{Item, Scalar, SubGroup};

const ENTRY_SEPARATOR: &str = "; ";
const PAIR_SEPARATOR: &str = ", ";
const CHILDREN_KEY: &str = "_childDocuments_";

/// Insertion-ordered field map. Field names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFields {
    entries: Vec<(String, String)>,
}

impl DocumentFields {
    /// Set `name`, replacing any earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn serialize_into<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        Ok(())
    }
}

impl Serialize for DocumentFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        self.serialize_into(&mut map)?;
        map.end()
    }
}

/// One sub-group entry as an index sub-document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildDocument {
    pub group: SubGroup,
    pub fields: DocumentFields,
}

impl ChildDocument {
    fn new(group: SubGroup, part_number: &str) -> Self {
        let mut fields = DocumentFields::default();
        fields.insert("type", group.child_type(part_number));
        Self { group, fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    /// Linking tag, e.g. `description - ABC123`.
    pub fn doc_type(&self) -> &str {
        self.fields.get("type").unwrap_or_default()
    }
}

impl Serialize for ChildDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Parent document for one item plus its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDocument {
    pub fields: DocumentFields,
    pub children: Vec<ChildDocument>,
}

impl IndexDocument {
    pub fn product_id(&self) -> &str {
        self.fields.get(Scalar::PartNumber.index_field()).unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn children_of(&self, group: SubGroup) -> impl Iterator<Item = &ChildDocument> {
        self.children.iter().filter(move |child| child.group == group)
    }
}

impl Serialize for IndexDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.children.is_empty());
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        self.fields.serialize_into(&mut map)?;
        if !self.children.is_empty() {
            map.serialize_entry(CHILDREN_KEY, &self.children)?;
        }
        map.end()
    }
}

/// Stateless `Item` → `IndexDocument` transform.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentBuilder;

impl DocumentBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the index document for `item`, or `None` when its part number
    /// is blank.
    pub fn build(&self, item: &Item) -> Option<IndexDocument> {
        let part_number = item.part_number.trim();
        if part_number.is_empty() {
            warn!(brand = %item.brand_label, "skipping item with blank part number");
            return None;
        }

        let mut fields = DocumentFields::default();
        fields.insert(Scalar::PartNumber.index_field(), part_number);
        for scalar in Scalar::ALL.into_iter().filter(|s| *s != Scalar::PartNumber) {
            let value = item.scalar(scalar);
            if !value.is_empty() {
                fields.insert(scalar.index_field(), value);
            }
        }

        for group in SubGroup::ALL {
            let text = flatten(item, group);
            if !text.is_empty() {
                fields.insert(group.index_field(), text);
            }
        }

        let mut children = Vec::new();
        for group in SubGroup::ALL {
            push_children(item, group, part_number, &mut children);
        }

        Some(IndexDocument { fields, children })
    }
}

/// Join formatted entries of one sub-group, skipping empty ones.
fn flatten(item: &Item, group: SubGroup) -> String {
    let entries: Vec<String> = match group {
        SubGroup::Descriptions => item
            .descriptions
            .iter()
            .filter(|d| !d.text.is_empty())
            .map(|d| {
                let seq = if d.sequence.is_empty() {
                    String::new()
                } else {
                    format!(", Seq={}", d.sequence)
                };
                format!("{} ({}{}): {}", d.description_code, d.language_code, seq, d.text)
            })
            .collect(),
        SubGroup::ExtendedInformation => item
            .extended_information
            .iter()
            .filter(|e| !e.text.is_empty())
            .map(|e| format!("{} - {}", e.expi_code, e.text))
            .collect(),
        SubGroup::ProductAttributes => item
            .product_attributes
            .iter()
            .filter(|a| !a.text.is_empty())
            .map(|a| format!("{}: {}", a.attribute_id, a.text))
            .collect(),
        SubGroup::Packages => item.packages.iter().map(|p| join_pairs(p.iter())).collect(),
        SubGroup::Prices => item.prices.iter().map(|p| join_pairs(p.pairs())).collect(),
        SubGroup::DigitalAssets => item
            .digital_assets
            .iter()
            .map(|a| join_pairs(a.pairs()))
            .collect(),
        SubGroup::PartInterchangeInfo => item
            .part_interchange_info
            .iter()
            .map(|i| join_pairs(i.pairs()))
            .collect(),
    };

    entries
        .into_iter()
        .filter(|entry| !entry.is_empty())
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

fn join_pairs<'k, 'v>(pairs: impl IntoIterator<Item = (&'k str, &'v str)>) -> String {
    pairs
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(PAIR_SEPARATOR)
}

fn push_children(item: &Item, group: SubGroup, part_number: &str, out: &mut Vec<ChildDocument>) {
    match group {
        SubGroup::Descriptions => {
            for d in &item.descriptions {
                if [&d.description_code, &d.language_code, &d.text]
                    .iter()
                    .all(|v| v.is_empty())
                {
                    continue;
                }
                let mut child = ChildDocument::new(group, part_number);
                child.fields.insert("descriptionCode", d.description_code.as_str());
                child.fields.insert("languageCode", d.language_code.as_str());
                child.fields.insert("descriptionText", d.text.as_str());
                out.push(child);
            }
        }
        SubGroup::ExtendedInformation => {
            for e in &item.extended_information {
                if e.expi_code.is_empty() && e.text.is_empty() {
                    continue;
                }
                let mut child = ChildDocument::new(group, part_number);
                child.fields.insert("expiCode", e.expi_code.as_str());
                child.fields.insert("extendedInfoText", e.text.as_str());
                out.push(child);
            }
        }
        SubGroup::ProductAttributes => {
            for a in &item.product_attributes {
                if a.attribute_id.is_empty() && a.text.is_empty() {
                    continue;
                }
                let mut child = ChildDocument::new(group, part_number);
                child.fields.insert("attributeID", a.attribute_id.as_str());
                child.fields.insert("attributeText", a.text.as_str());
                out.push(child);
            }
        }
        SubGroup::Prices => {
            for p in &item.prices {
                if p.pairs().iter().all(|(_, v)| v.is_empty()) {
                    continue;
                }
                let mut child = ChildDocument::new(group, part_number);
                child.fields.insert("priceType", p.price_type.as_str());
                child.fields.insert("currencyCode", p.currency_code.as_str());
                child.fields.insert("priceValue", p.price.as_str());
                out.push(child);
            }
        }
        SubGroup::Packages => {
            for p in &item.packages {
                push_prefixed(out, group, part_number, "package_", p.iter());
            }
        }
        SubGroup::DigitalAssets => {
            for a in &item.digital_assets {
                push_prefixed(out, group, part_number, "digitalAsset_", a.pairs());
            }
        }
        SubGroup::PartInterchangeInfo => {
            for i in &item.part_interchange_info {
                push_prefixed(out, group, part_number, "interchange_", i.pairs());
            }
        }
    }
}

fn push_prefixed<'k, 'v>(
    out: &mut Vec<ChildDocument>,
    group: SubGroup,
    part_number: &str,
    prefix: &str,
    pairs: impl IntoIterator<Item = (&'k str, &'v str)>,
) {
    let mut child = ChildDocument::new(group, part_number);
    for (key, value) in pairs {
        if !value.is_empty() {
            child.fields.insert(format!("{prefix}{key}"), value);
        }
    }
    // Only the type tag: nothing to index.
    if child.fields.len() > 1 {
        out.push(child);
    }
}
