//! Streaming item parser.
//!
//! [`ItemStream`] pulls XML events one at a time and yields one [`Item`] per
//! `<Item>` element inside the `<Items>` block. Only the item currently being
//! assembled is held in memory, so a feed of any size parses in memory
//! bounded by its largest item.
//!
//! ```text
//! Outside ──<Items>──▶ InItems ──<Item>──▶ InItem ──</Item>──▶ InItems
//!                         │                  │
//!                     </Items>          scalar tag ──▶ leaf text
//!                         ▼             container  ──▶ GroupParser
//!                      Terminal
//! ```
//!
//! `</Items>` stops the stream: nothing after it is read. A structural
//! error is returned once and fuses the stream. Unknown elements at any
//! level are skipped together with everything inside them.
//!
//! # Example
//!
//! ```rust
//! use catalog_indexer_core::parser::ItemStream;
//!
//! let xml = r#"<Items><Item><PartNumber>ABC123</PartNumber></Item></Items>"#;
//! let items: Vec<_> = ItemStream::new(xml.as_bytes())
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(items.len(), 1);
//! assert_eq!(items[0].part_number, "ABC123");
//! ```

use std::io::BufRead;

use tracing::{debug, trace};

use crate::error::ParseError;
use crate::model::{
    set_first, Description, DigitalAsset, ExtendedInformation, GroupEntry, Item, Package,
    PartInterchange, Price, ProductAttribute, Scalar, SubGroup,
};
use crate::reader::{EventSource, OpenTag, XmlEvent};

const ITEMS_TAG: &str = "Items";
const ITEM_TAG: &str = "Item";

/// Leaf elements recorded on a package under their own name.
const PACKAGE_LEAVES: [&str; 11] = [
    "PackageLevelGTIN",
    "PackageBarCodeCharacters",
    "PackageUOM",
    "InnerQuantity",
    "MerchandisingHeight",
    "MerchandisingWidth",
    "MerchandisingLength",
    "ShippingHeight",
    "ShippingWidth",
    "ShippingLength",
    "Weight",
];

const ASSET_LEAVES: [&str; 7] = [
    "FileName",
    "AssetType",
    "FileType",
    "Representation",
    "Background",
    "OrientationView",
    "URI",
];

/// Parse an in-memory feed into items.
pub fn parse_items(xml: &str) -> Result<Vec<Item>, ParseError> {
    ItemStream::new(xml.as_bytes()).collect()
}

enum State {
    /// Before `<Items>`, with the wrapper elements still open.
    Outside(Vec<String>),
    InItems,
    InItem(Item),
    Terminal,
}

/// Lazy, forward-only sequence of items read from an XML feed.
pub struct ItemStream<R> {
    source: EventSource<R>,
    state: State,
}

impl<R: BufRead> ItemStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            source: EventSource::new(reader),
            state: State::Outside(Vec::new()),
        }
    }

    /// Byte offset reached in the underlying stream.
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    fn advance(&mut self) -> Result<Option<Item>, ParseError> {
        loop {
            if matches!(self.state, State::Terminal) {
                return Ok(None);
            }
            let event = self.source.next_event()?;
            // Left as Terminal if anything below returns early.
            let state = std::mem::replace(&mut self.state, State::Terminal);
            self.state = match (state, event) {
                (State::Outside(_), XmlEvent::Open(tag)) if tag.name() == ITEMS_TAG => {
                    State::InItems
                }
                (State::Outside(mut open), XmlEvent::Open(tag)) => {
                    open.push(tag.name().to_string());
                    State::Outside(open)
                }
                (State::Outside(mut open), XmlEvent::Close(_)) => {
                    open.pop();
                    State::Outside(open)
                }
                (State::Outside(open), XmlEvent::Text(_)) => State::Outside(open),
                (State::Outside(open), XmlEvent::Eof) => match open.first() {
                    Some(outer) => return Err(self.unexpected_eof(outer)),
                    None => return Ok(None),
                },

                (State::InItems, XmlEvent::Open(tag)) if tag.name() == ITEM_TAG => {
                    State::InItem(Item::default())
                }
                (State::InItems, XmlEvent::Open(tag)) => {
                    trace!(tag = tag.name(), "skipping element inside <Items>");
                    self.source.skip(&tag)?;
                    State::InItems
                }
                // Children are consumed whole, so the only close seen here is </Items>.
                (State::InItems, XmlEvent::Close(_)) => {
                    debug!("reached </Items>, stopping");
                    return Ok(None);
                }
                (State::InItems, XmlEvent::Text(_)) => State::InItems,
                (State::InItems, XmlEvent::Eof) => return Err(self.unexpected_eof(ITEMS_TAG)),

                (State::InItem(mut item), XmlEvent::Open(tag)) => {
                    self.item_child(&mut item, &tag)?;
                    State::InItem(item)
                }
                (State::InItem(item), XmlEvent::Close(_)) => {
                    let item = finish_item(item);
                    debug!(part_number = %item.part_number, "item parsed");
                    self.state = State::InItems;
                    return Ok(Some(item));
                }
                (State::InItem(item), XmlEvent::Text(_)) => State::InItem(item),
                (State::InItem(_), XmlEvent::Eof) => return Err(self.unexpected_eof(ITEM_TAG)),

                (State::Terminal, _) => return Ok(None),
            };
        }
    }

    fn item_child(&mut self, item: &mut Item, tag: &OpenTag) -> Result<(), ParseError> {
        if let Some(scalar) = Scalar::from_tag(tag.name()) {
            let value = self.source.read_leaf_text(tag)?;
            set_first(item.scalar_mut(scalar), value);
        } else if let Some(group) = SubGroup::from_container(tag.name()) {
            for entry in GroupParser::new(group).run(&mut self.source)? {
                item.push_entry(entry);
            }
        } else {
            trace!(tag = tag.name(), "skipping unrecognized item element");
            self.source.skip(tag)?;
        }
        Ok(())
    }

    fn unexpected_eof(&self, open: &str) -> ParseError {
        ParseError::UnexpectedEof {
            position: self.source.position(),
            open: open.to_string(),
        }
    }
}

impl<R: BufRead> Iterator for ItemStream<R> {
    type Item = Result<Item, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(item) => item.map(Ok),
            Err(err) => {
                self.state = State::Terminal;
                Some(Err(err))
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for ItemStream<R> {}

fn finish_item(mut item: Item) -> Item {
    for interchange in &mut item.part_interchange_info {
        interchange.product_id = item.part_number.clone();
    }
    item
}

/// Nested element currently open inside a sub-group entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    Entry,
    Dimensions,
    Weights,
    AssetDimensions,
}

impl Nesting {
    fn tag(self) -> Option<&'static str> {
        match self {
            Nesting::Entry => None,
            Nesting::Dimensions => Some("Dimensions"),
            Nesting::Weights => Some("Weights"),
            Nesting::AssetDimensions => Some("AssetDimensions"),
        }
    }
}

/// Parses one sub-group container up to and including its close tag.
struct GroupParser {
    group: SubGroup,
    current: Option<GroupEntry>,
    nesting: Nesting,
    entries: Vec<GroupEntry>,
}

impl GroupParser {
    fn new(group: SubGroup) -> Self {
        Self {
            group,
            current: None,
            nesting: Nesting::Entry,
            entries: Vec::new(),
        }
    }

    fn run<R: BufRead>(mut self, source: &mut EventSource<R>) -> Result<Vec<GroupEntry>, ParseError> {
        loop {
            match source.next_event()? {
                XmlEvent::Open(tag) => self.open(source, &tag)?,
                XmlEvent::Close(name) => {
                    if name == self.group.entry_tag() {
                        if let Some(entry) = self.current.take() {
                            self.entries.push(entry);
                        }
                        self.nesting = Nesting::Entry;
                    } else if self.nesting.tag() == Some(name.as_str()) {
                        self.nesting = Nesting::Entry;
                    } else if name == self.group.container_tag() {
                        return Ok(self.entries);
                    }
                }
                XmlEvent::Text(_) => {}
                XmlEvent::Eof => {
                    return Err(ParseError::UnexpectedEof {
                        position: source.position(),
                        open: self.group.container_tag().to_string(),
                    })
                }
            }
        }
    }

    fn open<R: BufRead>(&mut self, source: &mut EventSource<R>, tag: &OpenTag) -> Result<(), ParseError> {
        if self.current.is_none() && tag.name() == self.group.entry_tag() {
            return self.open_entry(source, tag);
        }
        match self.current.as_mut() {
            Some(entry) => entry_child(entry, &mut self.nesting, source, tag),
            None => {
                trace!(tag = tag.name(), container = self.group.container_tag(), "skipping element");
                source.skip(tag)
            }
        }
    }

    /// Text-bearing entries are read to their close tag right away; the
    /// others stay open until their close tag arrives in [`run`](Self::run).
    fn open_entry<R: BufRead>(&mut self, source: &mut EventSource<R>, tag: &OpenTag) -> Result<(), ParseError> {
        let attr = |name: &str| tag.attribute(name).to_string();
        match self.group {
            SubGroup::Descriptions => {
                let text = source.read_leaf_text(tag)?;
                self.entries.push(GroupEntry::Description(Description {
                    description_code: attr("DescriptionCode"),
                    language_code: attr("LanguageCode"),
                    sequence: attr("Sequence"),
                    text,
                }));
            }
            SubGroup::ExtendedInformation => {
                let text = source.read_leaf_text(tag)?;
                self.entries
                    .push(GroupEntry::ExtendedInformation(ExtendedInformation {
                        expi_code: attr("EXPICode"),
                        language_code: attr("LanguageCode"),
                        text,
                    }));
            }
            SubGroup::ProductAttributes => {
                let text = source.read_leaf_text(tag)?;
                self.entries
                    .push(GroupEntry::ProductAttribute(ProductAttribute {
                        attribute_id: attr("AttributeID"),
                        text,
                    }));
            }
            SubGroup::Packages => {
                self.current = Some(GroupEntry::Package(Package::default()));
            }
            SubGroup::Prices => {
                self.current = Some(GroupEntry::Price(Price {
                    price_type: attr("PriceType"),
                    ..Default::default()
                }));
            }
            SubGroup::DigitalAssets => {
                self.current = Some(GroupEntry::DigitalAsset(DigitalAsset {
                    language_code: attr("LanguageCode"),
                    maintenance_type: attr("MaintenanceType"),
                    ..Default::default()
                }));
            }
            SubGroup::PartInterchangeInfo => {
                self.current = Some(GroupEntry::PartInterchange(PartInterchange {
                    part_brand_aaiaid: attr("BrandAAIAID"),
                    part_brand_label: attr("BrandLabel"),
                    item_equivalent_uom: attr("ItemEquivalentUOM"),
                    ..Default::default()
                }));
            }
        }
        Ok(())
    }
}

/// Dispatch one child element of an open entry.
fn entry_child<R: BufRead>(
    entry: &mut GroupEntry,
    nesting: &mut Nesting,
    source: &mut EventSource<R>,
    tag: &OpenTag,
) -> Result<(), ParseError> {
    let name = tag.name();
    match (entry, name) {
        (GroupEntry::Package(pkg), "Dimensions") => {
            *nesting = Nesting::Dimensions;
            pkg.insert("DimensionUOM", tag.attribute("UOM").to_string());
        }
        (GroupEntry::Package(pkg), "Weights") => {
            *nesting = Nesting::Weights;
            pkg.insert("WeightUOM", tag.attribute("UOM").to_string());
        }
        (GroupEntry::Package(pkg), "DimensionalWeight") if *nesting == Nesting::Weights => {
            pkg.insert(name, source.read_leaf_text(tag)?);
        }
        (GroupEntry::Package(pkg), leaf) if PACKAGE_LEAVES.contains(&leaf) => {
            pkg.insert(leaf, source.read_leaf_text(tag)?);
        }

        (GroupEntry::Price(price), "CurrencyCode") => {
            set_first(&mut price.currency_code, source.read_leaf_text(tag)?);
        }
        (GroupEntry::Price(price), "Price") => {
            set_first(&mut price.price, source.read_leaf_text(tag)?);
        }

        (GroupEntry::DigitalAsset(asset), "AssetDimensions") => {
            *nesting = Nesting::AssetDimensions;
            set_first(&mut asset.asset_uom, tag.attribute("UOM").to_string());
        }
        (GroupEntry::DigitalAsset(asset), "AssetHeight") if *nesting == Nesting::AssetDimensions => {
            set_first(&mut asset.asset_height, source.read_leaf_text(tag)?);
        }
        (GroupEntry::DigitalAsset(asset), "AssetWidth") if *nesting == Nesting::AssetDimensions => {
            set_first(&mut asset.asset_width, source.read_leaf_text(tag)?);
        }
        (GroupEntry::DigitalAsset(asset), leaf) if ASSET_LEAVES.contains(&leaf) => {
            let value = source.read_leaf_text(tag)?;
            if let Some(slot) = asset_leaf(asset, leaf) {
                set_first(slot, value);
            }
        }

        (GroupEntry::PartInterchange(interchange), "PartNumber") => {
            set_first(
                &mut interchange.interchange_quantity,
                tag.attribute("InterchangeQuantity").to_string(),
            );
            set_first(&mut interchange.part_number_to, source.read_leaf_text(tag)?);
        }

        _ => {
            trace!(tag = name, "skipping unrecognized entry element");
            source.skip(tag)?;
        }
    }
    Ok(())
}

fn asset_leaf<'a>(asset: &'a mut DigitalAsset, tag: &str) -> Option<&'a mut String> {
    match tag {
        "FileName" => Some(&mut asset.file_name),
        "AssetType" => Some(&mut asset.asset_type),
        "FileType" => Some(&mut asset.file_type),
        "Representation" => Some(&mut asset.representation),
        "Background" => Some(&mut asset.background),
        "OrientationView" => Some(&mut asset.orientation_view),
        "URI" => Some(&mut asset.uri),
        _ => None,
    }
}
