use crate::{
    data::property::Property,
    lang::TextLookup,
    schema::{CategorySpec, Schema},
};

/// Image identifier used by categories that do not name their own.
pub const DEFAULT_IMAGE: &str = "default.jpg";

/// Named, ordered group of properties shown together.
///
/// Membership is fixed at construction; only the properties mutate.
#[derive(Debug, Clone)]
pub struct Category {
    title: String,
    image: String,
    properties: Vec<Property>,
}

impl Category {
    /// Builds a category and initialises each of its properties.
    pub fn new(spec: &CategorySpec, schema: &Schema, lang: &dyn TextLookup) -> Self {
        let properties = spec
            .properties
            .iter()
            .map(|p| {
                let mut prop = Property::new(p, lang);
                prop.initialise(schema);
                prop
            })
            .collect();
        Self {
            title: lang.lookup_or_key(&spec.title).title,
            image: spec
                .image
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            properties,
        }
    }

    /// Language-resolved display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Logical image identifier, resolved to an asset by the caller.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Properties in file order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub(crate) fn properties_mut(&mut self) -> &mut [Property] {
        &mut self.properties
    }
}
