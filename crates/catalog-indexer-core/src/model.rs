//! Typed catalog records produced by the feed parser.
//!
//! An [`Item`] holds ten scalar fields and seven ordered sub-group lists.
//! Field names serialize in camelCase so items can be handed to the
//! persistence side as JSON without a second mapping layer.
//!
//! Every field follows the same write policy: the first non-empty value
//! wins and later duplicates are ignored (see [`set_first`]).

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Assign `value` to `slot` unless `slot` already holds a non-empty value.
pub fn set_first(slot: &mut String, value: String) {
    if slot.is_empty() && !value.is_empty() {
        *slot = value;
    }
}

/// One parsed catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub part_number: String,
    #[serde(rename = "itemLevelGTIN")]
    pub item_level_gtin: String,
    pub item_quantity_size: String,
    pub quantity_per_application: String,
    pub minimum_order_quantity: String,
    #[serde(rename = "brandAAIAID")]
    pub brand_aaiaid: String,
    pub brand_label: String,
    #[serde(rename = "subBrandAAIAID")]
    pub sub_brand_aaiaid: String,
    pub sub_brand_label: String,
    #[serde(rename = "partTerminologyID")]
    pub part_terminology_id: String,
    pub descriptions: Vec<Description>,
    pub extended_information: Vec<ExtendedInformation>,
    pub product_attributes: Vec<ProductAttribute>,
    pub packages: Vec<Package>,
    pub prices: Vec<Price>,
    pub digital_assets: Vec<DigitalAsset>,
    pub part_interchange_info: Vec<PartInterchange>,
}

impl Item {
    /// Value of a scalar field.
    pub fn scalar(&self, scalar: Scalar) -> &str {
        match scalar {
            Scalar::PartNumber => &self.part_number,
            Scalar::ItemLevelGtin => &self.item_level_gtin,
            Scalar::ItemQuantitySize => &self.item_quantity_size,
            Scalar::QuantityPerApplication => &self.quantity_per_application,
            Scalar::MinimumOrderQuantity => &self.minimum_order_quantity,
            Scalar::BrandAaiaid => &self.brand_aaiaid,
            Scalar::BrandLabel => &self.brand_label,
            Scalar::SubBrandAaiaid => &self.sub_brand_aaiaid,
            Scalar::SubBrandLabel => &self.sub_brand_label,
            Scalar::PartTerminologyId => &self.part_terminology_id,
        }
    }

    pub fn scalar_mut(&mut self, scalar: Scalar) -> &mut String {
        match scalar {
            Scalar::PartNumber => &mut self.part_number,
            Scalar::ItemLevelGtin => &mut self.item_level_gtin,
            Scalar::ItemQuantitySize => &mut self.item_quantity_size,
            Scalar::QuantityPerApplication => &mut self.quantity_per_application,
            Scalar::MinimumOrderQuantity => &mut self.minimum_order_quantity,
            Scalar::BrandAaiaid => &mut self.brand_aaiaid,
            Scalar::BrandLabel => &mut self.brand_label,
            Scalar::SubBrandAaiaid => &mut self.sub_brand_aaiaid,
            Scalar::SubBrandLabel => &mut self.sub_brand_label,
            Scalar::PartTerminologyId => &mut self.part_terminology_id,
        }
    }

    /// Append one sub-group entry to the matching list.
    pub fn push_entry(&mut self, entry: GroupEntry) {
        match entry {
            GroupEntry::Description(e) => self.descriptions.push(e),
            GroupEntry::ExtendedInformation(e) => self.extended_information.push(e),
            GroupEntry::ProductAttribute(e) => self.product_attributes.push(e),
            GroupEntry::Package(e) => self.packages.push(e),
            GroupEntry::Price(e) => self.prices.push(e),
            GroupEntry::DigitalAsset(e) => self.digital_assets.push(e),
            GroupEntry::PartInterchange(e) => self.part_interchange_info.push(e),
        }
    }

    /// Number of entries in one sub-group.
    pub fn entry_count(&self, group: SubGroup) -> usize {
        match group {
            SubGroup::Descriptions => self.descriptions.len(),
            SubGroup::ExtendedInformation => self.extended_information.len(),
            SubGroup::ProductAttributes => self.product_attributes.len(),
            SubGroup::Packages => self.packages.len(),
            SubGroup::Prices => self.prices.len(),
            SubGroup::DigitalAssets => self.digital_assets.len(),
            SubGroup::PartInterchangeInfo => self.part_interchange_info.len(),
        }
    }
}

/// The ten scalar leaf tags directly under `<Item>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    PartNumber,
    ItemLevelGtin,
    ItemQuantitySize,
    QuantityPerApplication,
    MinimumOrderQuantity,
    BrandAaiaid,
    BrandLabel,
    SubBrandAaiaid,
    SubBrandLabel,
    PartTerminologyId,
}

impl Scalar {
    pub const ALL: [Scalar; 10] = [
        Scalar::PartNumber,
        Scalar::ItemLevelGtin,
        Scalar::ItemQuantitySize,
        Scalar::QuantityPerApplication,
        Scalar::MinimumOrderQuantity,
        Scalar::BrandAaiaid,
        Scalar::BrandLabel,
        Scalar::SubBrandAaiaid,
        Scalar::SubBrandLabel,
        Scalar::PartTerminologyId,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.tag() == tag)
    }

    /// Element name in the feed.
    pub fn tag(self) -> &'static str {
        match self {
            Scalar::PartNumber => "PartNumber",
            Scalar::ItemLevelGtin => "ItemLevelGTIN",
            Scalar::ItemQuantitySize => "ItemQuantitySize",
            Scalar::QuantityPerApplication => "QuantityPerApplication",
            Scalar::MinimumOrderQuantity => "MinimumOrderQuantity",
            Scalar::BrandAaiaid => "BrandAAIAID",
            Scalar::BrandLabel => "BrandLabel",
            Scalar::SubBrandAaiaid => "SubBrandAAIAID",
            Scalar::SubBrandLabel => "SubBrandLabel",
            Scalar::PartTerminologyId => "PartTerminologyID",
        }
    }

    /// Field name on the index document.
    pub fn index_field(self) -> &'static str {
        match self {
            Scalar::PartNumber => "productId",
            Scalar::ItemLevelGtin => "idValue",
            Scalar::ItemQuantitySize => "piecesIncluded",
            Scalar::QuantityPerApplication => "quantityIncluded",
            Scalar::MinimumOrderQuantity => "orderDecimalQuantity",
            Scalar::BrandAaiaid => "brandAAIAID",
            Scalar::BrandLabel => "brandLabel",
            Scalar::SubBrandAaiaid => "subBrandAAIAID",
            Scalar::SubBrandLabel => "subBrandLabel",
            Scalar::PartTerminologyId => "partTerminologyID",
        }
    }
}

/// The seven repeated sub-group containers under `<Item>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubGroup {
    Descriptions,
    ExtendedInformation,
    ProductAttributes,
    Packages,
    Prices,
    DigitalAssets,
    PartInterchangeInfo,
}

impl SubGroup {
    /// Index document order.
    pub const ALL: [SubGroup; 7] = [
        SubGroup::Descriptions,
        SubGroup::ExtendedInformation,
        SubGroup::ProductAttributes,
        SubGroup::Packages,
        SubGroup::Prices,
        SubGroup::DigitalAssets,
        SubGroup::PartInterchangeInfo,
    ];

    pub fn from_container(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.container_tag() == tag)
    }

    pub fn container_tag(self) -> &'static str {
        match self {
            SubGroup::Descriptions => "Descriptions",
            SubGroup::ExtendedInformation => "ExtendedInformation",
            SubGroup::ProductAttributes => "ProductAttributes",
            SubGroup::Packages => "Packages",
            SubGroup::Prices => "Prices",
            SubGroup::DigitalAssets => "DigitalAssets",
            SubGroup::PartInterchangeInfo => "PartInterchangeInfo",
        }
    }

    /// The repeating element inside the container.
    pub fn entry_tag(self) -> &'static str {
        match self {
            SubGroup::Descriptions => "Description",
            SubGroup::ExtendedInformation => "ExtendedProductInformation",
            SubGroup::ProductAttributes => "ProductAttribute",
            SubGroup::Packages => "Package",
            SubGroup::Prices => "Pricing",
            SubGroup::DigitalAssets => "DigitalFileInformation",
            SubGroup::PartInterchangeInfo => "PartInterchange",
        }
    }

    /// Name of the flattened text field on the index document.
    pub fn index_field(self) -> &'static str {
        match self {
            SubGroup::Descriptions => "descriptions",
            SubGroup::ExtendedInformation => "extendedInformation",
            SubGroup::ProductAttributes => "productAttributes",
            SubGroup::Packages => "packages",
            SubGroup::Prices => "prices",
            SubGroup::DigitalAssets => "digitalAssets",
            SubGroup::PartInterchangeInfo => "partInterchangeInfo",
        }
    }

    /// Label used in a child document's `type` field.
    pub fn child_label(self) -> &'static str {
        match self {
            SubGroup::Descriptions => "description",
            SubGroup::ExtendedInformation => "extendedInformation",
            SubGroup::ProductAttributes => "productAttribute",
            SubGroup::Packages => "package",
            SubGroup::Prices => "price",
            SubGroup::DigitalAssets => "digital-asset",
            SubGroup::PartInterchangeInfo => "partInterchange",
        }
    }

    /// `type` value linking a child document to its owning part.
    pub fn child_type(self, part_number: &str) -> String {
        format!("{} - {}", self.child_label(), part_number)
    }
}

/// One sub-group entry, tagged by the container it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEntry {
    Description(Description),
    ExtendedInformation(ExtendedInformation),
    ProductAttribute(ProductAttribute),
    Package(Package),
    Price(Price),
    DigitalAsset(DigitalAsset),
    PartInterchange(PartInterchange),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    pub description_code: String,
    pub language_code: String,
    pub sequence: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedInformation {
    pub expi_code: String,
    pub language_code: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttribute {
    pub attribute_id: String,
    pub text: String,
}

/// Packaging details as an ordered key → value record.
///
/// Keys are the feed's element names (`PackageUOM`, `ShippingHeight`, ...)
/// plus `DimensionUOM` / `WeightUOM` taken from the nested containers.
/// Keys are unique; insertion order is kept for reproducible output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    fields: Vec<(String, String)>,
}

impl Package {
    /// Record `value` under `key` unless the key already holds a value.
    /// Empty values are never recorded.
    pub fn insert(&mut self, key: &str, value: String) {
        if value.is_empty() || self.get(key).is_some() {
            return;
        }
        self.fields.push((key.to_string(), value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Package {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut package = Package::default();
        for (key, value) in iter {
            package.insert(&key.into(), value.into());
        }
        package
    }
}

impl Serialize for Package {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub price_type: String,
    pub currency_code: String,
    pub price: String,
}

impl Price {
    /// Key/value pairs in flattening order.
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("PriceType", self.price_type.as_str()),
            ("CurrencyCode", self.currency_code.as_str()),
            ("Price", self.price.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalAsset {
    pub language_code: String,
    pub maintenance_type: String,
    pub file_name: String,
    pub asset_type: String,
    pub file_type: String,
    pub representation: String,
    pub background: String,
    pub orientation_view: String,
    pub uri: String,
    #[serde(rename = "assetUOM")]
    pub asset_uom: String,
    pub asset_height: String,
    pub asset_width: String,
}

impl DigitalAsset {
    pub fn pairs(&self) -> [(&'static str, &str); 12] {
        [
            ("LanguageCode", self.language_code.as_str()),
            ("MaintenanceType", self.maintenance_type.as_str()),
            ("FileName", self.file_name.as_str()),
            ("AssetType", self.asset_type.as_str()),
            ("FileType", self.file_type.as_str()),
            ("Representation", self.representation.as_str()),
            ("Background", self.background.as_str()),
            ("OrientationView", self.orientation_view.as_str()),
            ("URI", self.uri.as_str()),
            ("AssetUOM", self.asset_uom.as_str()),
            ("AssetHeight", self.asset_height.as_str()),
            ("AssetWidth", self.asset_width.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartInterchange {
    #[serde(rename = "partBrandAAIAID")]
    pub part_brand_aaiaid: String,
    pub part_brand_label: String,
    #[serde(rename = "itemEquivalentUOM")]
    pub item_equivalent_uom: String,
    /// Part number of the owning item.
    pub product_id: String,
    pub interchange_quantity: String,
    pub part_number_to: String,
}

impl PartInterchange {
    pub fn pairs(&self) -> [(&'static str, &str); 6] {
        [
            ("partBrandAAIAID", self.part_brand_aaiaid.as_str()),
            ("partBrandLabel", self.part_brand_label.as_str()),
            ("ItemEquivalentUOM", self.item_equivalent_uom.as_str()),
            ("productId", self.product_id.as_str()),
            ("InterchangeQuantity", self.interchange_quantity.as_str()),
            ("PartNumberTo", self.part_number_to.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_first_keeps_first_non_empty() {
        let mut slot = String::new();
        set_first(&mut slot, String::new());
        assert_eq!(slot, "");
        set_first(&mut slot, "A".to_string());
        set_first(&mut slot, "B".to_string());
        assert_eq!(slot, "A");
    }

    #[test]
    fn package_keys_are_unique_and_ordered() {
        let mut pkg = Package::default();
        pkg.insert("PackageUOM", "EA".to_string());
        pkg.insert("Weight", String::new());
        pkg.insert("PackageUOM", "BX".to_string());
        pkg.insert("Weight", "2.5".to_string());
        let pairs: Vec<_> = pkg.iter().collect();
        assert_eq!(pairs, vec![("PackageUOM", "EA"), ("Weight", "2.5")]);
    }

    #[test]
    fn scalar_and_group_tables_round_trip_tags() {
        for scalar in Scalar::ALL {
            assert_eq!(Scalar::from_tag(scalar.tag()), Some(scalar));
        }
        for group in SubGroup::ALL {
            assert_eq!(SubGroup::from_container(group.container_tag()), Some(group));
        }
        assert_eq!(Scalar::from_tag("Item"), None);
        assert_eq!(SubGroup::from_container("Description"), None);
    }

    #[test]
    fn item_serializes_camel_case() {
        let item = Item {
            part_number: "ABC123".to_string(),
            item_level_gtin: "00012345678905".to_string(),
            packages: vec![[("PackageUOM", "EA")].into_iter().collect()],
            ..Default::default()
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["partNumber"], "ABC123");
        assert_eq!(json["itemLevelGTIN"], "00012345678905");
        assert_eq!(json["packages"][0]["PackageUOM"], "EA");
        assert!(json["descriptions"].as_array().unwrap().is_empty());
    }
}
