//! Tile and toast template registry.
//!
//! Slot counts follow the Windows 8 tile and toast template catalogs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::WnsError;
use crate::models::NotificationType;

/// Named WNS tile or toast layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    TileSquareBlock,
    TileSquareText01,
    TileSquareText02,
    TileSquareText03,
    TileSquareText04,
    TileWideText01,
    TileWideText02,
    TileWideText03,
    TileWideText04,
    TileWideText05,
    TileWideText06,
    TileWideText07,
    TileWideText08,
    TileWideText09,
    TileWideText10,
    TileWideText11,
    TileSquareImage,
    TileSquarePeekImageAndText01,
    TileSquarePeekImageAndText02,
    TileSquarePeekImageAndText03,
    TileSquarePeekImageAndText04,
    TileWideImage,
    TileWideImageCollection,
    TileWideImageAndText01,
    TileWideImageAndText02,
    TileWideBlockAndText01,
    TileWideBlockAndText02,
    TileWideSmallImageAndText01,
    TileWideSmallImageAndText02,
    TileWideSmallImageAndText03,
    TileWideSmallImageAndText04,
    TileWideSmallImageAndText05,
    TileWidePeekImageCollection01,
    TileWidePeekImageCollection02,
    TileWidePeekImageCollection03,
    TileWidePeekImageCollection04,
    TileWidePeekImageCollection05,
    TileWidePeekImageCollection06,
    TileWidePeekImageAndText01,
    TileWidePeekImageAndText02,
    TileWidePeekImage01,
    TileWidePeekImage02,
    TileWidePeekImage03,
    TileWidePeekImage04,
    TileWidePeekImage05,
    TileWidePeekImage06,
    ToastText01,
    ToastText02,
    ToastText03,
    ToastText04,
    ToastImageAndText01,
    ToastImageAndText02,
    ToastImageAndText03,
    ToastImageAndText04,
}

struct TemplateSlots {
    template: Template,
    name: &'static str,
    images: usize,
    texts: usize,
}

const fn row(template: Template, name: &'static str, images: usize, texts: usize) -> TemplateSlots {
    TemplateSlots {
        template,
        name,
        images,
        texts,
    }
}

/// One row per variant, in declaration order.
const REGISTRY: &[TemplateSlots] = &[
    row(Template::TileSquareBlock, "TileSquareBlock", 0, 2),
    row(Template::TileSquareText01, "TileSquareText01", 0, 4),
    row(Template::TileSquareText02, "TileSquareText02", 0, 2),
    row(Template::TileSquareText03, "TileSquareText03", 0, 4),
    row(Template::TileSquareText04, "TileSquareText04", 0, 1),
    row(Template::TileWideText01, "TileWideText01", 0, 5),
    row(Template::TileWideText02, "TileWideText02", 0, 9),
    row(Template::TileWideText03, "TileWideText03", 0, 1),
    row(Template::TileWideText04, "TileWideText04", 0, 1),
    row(Template::TileWideText05, "TileWideText05", 0, 5),
    row(Template::TileWideText06, "TileWideText06", 0, 10),
    row(Template::TileWideText07, "TileWideText07", 0, 9),
    row(Template::TileWideText08, "TileWideText08", 0, 10),
    row(Template::TileWideText09, "TileWideText09", 0, 2),
    row(Template::TileWideText10, "TileWideText10", 0, 9),
    row(Template::TileWideText11, "TileWideText11", 0, 10),
    row(Template::TileSquareImage, "TileSquareImage", 1, 0),
    row(Template::TileSquarePeekImageAndText01, "TileSquarePeekImageAndText01", 1, 4),
    row(Template::TileSquarePeekImageAndText02, "TileSquarePeekImageAndText02", 1, 2),
    row(Template::TileSquarePeekImageAndText03, "TileSquarePeekImageAndText03", 1, 4),
    row(Template::TileSquarePeekImageAndText04, "TileSquarePeekImageAndText04", 1, 1),
    row(Template::TileWideImage, "TileWideImage", 1, 0),
    row(Template::TileWideImageCollection, "TileWideImageCollection", 5, 0),
    row(Template::TileWideImageAndText01, "TileWideImageAndText01", 1, 1),
    row(Template::TileWideImageAndText02, "TileWideImageAndText02", 1, 2),
    row(Template::TileWideBlockAndText01, "TileWideBlockAndText01", 0, 6),
    row(Template::TileWideBlockAndText02, "TileWideBlockAndText02", 0, 3),
    row(Template::TileWideSmallImageAndText01, "TileWideSmallImageAndText01", 1, 1),
    row(Template::TileWideSmallImageAndText02, "TileWideSmallImageAndText02", 1, 5),
    row(Template::TileWideSmallImageAndText03, "TileWideSmallImageAndText03", 1, 1),
    row(Template::TileWideSmallImageAndText04, "TileWideSmallImageAndText04", 1, 2),
    row(Template::TileWideSmallImageAndText05, "TileWideSmallImageAndText05", 1, 2),
    row(Template::TileWidePeekImageCollection01, "TileWidePeekImageCollection01", 5, 2),
    row(Template::TileWidePeekImageCollection02, "TileWidePeekImageCollection02", 5, 5),
    row(Template::TileWidePeekImageCollection03, "TileWidePeekImageCollection03", 5, 1),
    row(Template::TileWidePeekImageCollection04, "TileWidePeekImageCollection04", 5, 1),
    row(Template::TileWidePeekImageCollection05, "TileWidePeekImageCollection05", 6, 2),
    row(Template::TileWidePeekImageCollection06, "TileWidePeekImageCollection06", 6, 1),
    row(Template::TileWidePeekImageAndText01, "TileWidePeekImageAndText01", 1, 1),
    row(Template::TileWidePeekImageAndText02, "TileWidePeekImageAndText02", 1, 5),
    row(Template::TileWidePeekImage01, "TileWidePeekImage01", 1, 2),
    row(Template::TileWidePeekImage02, "TileWidePeekImage02", 1, 5),
    row(Template::TileWidePeekImage03, "TileWidePeekImage03", 1, 1),
    row(Template::TileWidePeekImage04, "TileWidePeekImage04", 1, 1),
    row(Template::TileWidePeekImage05, "TileWidePeekImage05", 2, 2),
    row(Template::TileWidePeekImage06, "TileWidePeekImage06", 2, 1),
    row(Template::ToastText01, "ToastText01", 0, 1),
    row(Template::ToastText02, "ToastText02", 0, 2),
    row(Template::ToastText03, "ToastText03", 0, 2),
    row(Template::ToastText04, "ToastText04", 0, 3),
    row(Template::ToastImageAndText01, "ToastImageAndText01", 1, 1),
    row(Template::ToastImageAndText02, "ToastImageAndText02", 1, 2),
    row(Template::ToastImageAndText03, "ToastImageAndText03", 1, 2),
    row(Template::ToastImageAndText04, "ToastImageAndText04", 1, 3),
];

const _: () = assert!(REGISTRY.len() == Template::ToastImageAndText04 as usize + 1);

impl Template {
    /// Every registered template, tiles first
    pub fn all() -> impl Iterator<Item = Template> {
        REGISTRY.iter().map(|entry| entry.template)
    }

    fn slots(&self) -> &'static TemplateSlots {
        &REGISTRY[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.slots().name
    }

    /// Number of `<image>` elements in the layout
    pub fn image_count(&self) -> usize {
        self.slots().images
    }

    /// Number of `<text>` elements in the layout
    pub fn text_count(&self) -> usize {
        self.slots().texts
    }

    pub fn notification_type(&self) -> NotificationType {
        if self.name().starts_with("Tile") {
            NotificationType::Tile
        } else {
            NotificationType::Toast
        }
    }

    /// Positional parameters required: a src/alt pair per image, then one per text
    pub fn parameter_count(&self) -> usize {
        self.image_count() * 2 + self.text_count()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Template {
    type Err = WnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::all()
            .find(|t| t.name() == s)
            .ok_or_else(|| WnsError::validation(format!("Unknown WNS template {}.", s)))
    }
}

/// Template parameters, supplied either positionally or by slot name.
///
/// ```
/// use nova_wns_shared::TemplateParams;
///
/// let positional = TemplateParams::positional(["http://img/1.png", "A dog", "Woof"]);
/// let named = TemplateParams::named()
///     .image(1, "http://img/1.png", "A dog")
///     .text(1, "Woof");
/// # let _ = (positional, named);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParams {
    values: ParamValues,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParamValues {
    Positional(Vec<String>),
    Named {
        images: BTreeMap<usize, (Option<String>, Option<String>)>,
        texts: BTreeMap<usize, String>,
    },
}

impl TemplateParams {
    /// Flat list: `src, alt` for each image in order, then each text
    pub fn positional<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: ParamValues::Positional(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Start an empty named parameter set; unset slots render empty
    pub fn named() -> Self {
        Self {
            values: ParamValues::Named {
                images: BTreeMap::new(),
                texts: BTreeMap::new(),
            },
        }
    }

    /// Set `image{index}src` and `image{index}alt` (1-based)
    pub fn image(self, index: usize, src: impl Into<String>, alt: impl Into<String>) -> Self {
        self.image_src(index, src).image_alt(index, alt)
    }

    pub fn image_src(mut self, index: usize, src: impl Into<String>) -> Self {
        if let ParamValues::Named { images, .. } = &mut self.values {
            images.entry(index).or_default().0 = Some(src.into());
        }
        self
    }

    pub fn image_alt(mut self, index: usize, alt: impl Into<String>) -> Self {
        if let ParamValues::Named { images, .. } = &mut self.values {
            images.entry(index).or_default().1 = Some(alt.into());
        }
        self
    }

    /// Set `text{index}` (1-based)
    pub fn text(mut self, index: usize, text: impl Into<String>) -> Self {
        if let ParamValues::Named { texts, .. } = &mut self.values {
            texts.insert(index, text.into());
        }
        self
    }

    /// Resolve to the flat positional list the template expects
    pub(crate) fn resolve(&self, template: Template) -> Result<Vec<String>, WnsError> {
        match &self.values {
            ParamValues::Positional(values) => {
                if values.len() != template.parameter_count() {
                    return Err(WnsError::validation(format!(
                        "The {} WNS notification type requires {} text parameters to be specified ({} image(s) that require href and alt text each, and {} text field(s)), while only {} parameter(s) have been provided.",
                        template.name(),
                        template.parameter_count(),
                        template.image_count(),
                        template.text_count(),
                        values.len()
                    )));
                }
                Ok(values.clone())
            }
            ParamValues::Named { images, texts } => {
                let out_of_range_image = images
                    .iter()
                    .find(|(i, _)| **i == 0 || **i > template.image_count())
                    .map(|(i, (src, _))| match src {
                        Some(_) => format!("image{}src", i),
                        None => format!("image{}alt", i),
                    });
                let out_of_range_text = texts
                    .keys()
                    .find(|i| **i == 0 || **i > template.text_count())
                    .map(|i| format!("text{}", i));
                if let Some(field) = out_of_range_image.or(out_of_range_text) {
                    return Err(WnsError::validation(format!(
                        "The {} WNS notification type has no {} field.",
                        template.name(),
                        field
                    )));
                }

                let mut params = Vec::with_capacity(template.parameter_count());
                for i in 1..=template.image_count() {
                    let (src, alt) = images.get(&i).cloned().unwrap_or_default();
                    params.push(src.unwrap_or_default());
                    params.push(alt.unwrap_or_default());
                }
                for i in 1..=template.text_count() {
                    params.push(texts.get(&i).cloned().unwrap_or_default());
                }
                Ok(params)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_size() {
        let tiles = Template::all()
            .filter(|t| t.notification_type() == NotificationType::Tile)
            .count();
        let toasts = Template::all()
            .filter(|t| t.notification_type() == NotificationType::Toast)
            .count();

        assert_eq!(tiles, 46);
        assert_eq!(toasts, 8);
    }

    #[test]
    fn test_registry_rows_match_variants() {
        for (index, entry) in REGISTRY.iter().enumerate() {
            assert_eq!(entry.template as usize, index, "{} out of order", entry.name);
            assert_eq!(format!("{:?}", entry.template), entry.name);
        }
        assert_eq!(Template::TileWidePeekImageCollection05.image_count(), 6);
        assert_eq!(Template::ToastImageAndText04.text_count(), 3);
        assert_eq!("TileSquareImage".parse::<Template>().unwrap(), Template::TileSquareImage);
    }

    #[test]
    fn test_slot_counts() {
        assert_eq!(Template::TileWideImageAndText01.image_count(), 1);
        assert_eq!(Template::TileWideImageAndText01.text_count(), 1);
        assert_eq!(Template::TileWideImageAndText01.parameter_count(), 3);
        assert_eq!(Template::TileWidePeekImageCollection05.parameter_count(), 14);
        assert_eq!(Template::ToastText04.parameter_count(), 3);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "ToastImageAndText02".parse::<Template>().unwrap(),
            Template::ToastImageAndText02
        );
        assert!("TileHuge".parse::<Template>().is_err());
    }

    #[test]
    fn test_positional_count_mismatch() {
        let err = TemplateParams::positional(["a", "b"])
            .resolve(Template::TileWideImageAndText01)
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "The TileWideImageAndText01 WNS notification type requires 3 text parameters to be specified (1 image(s) that require href and alt text each, and 1 text field(s)), while only 2 parameter(s) have been provided."
        );
    }

    #[test]
    fn test_positional_exact_count() {
        let params = TemplateParams::positional(["src", "alt", "text"])
            .resolve(Template::TileWideImageAndText01)
            .unwrap();
        assert_eq!(params, vec!["src", "alt", "text"]);
    }

    #[test]
    fn test_named_fills_missing_slots() {
        let params = TemplateParams::named()
            .image_src(2, "two.png")
            .text(1, "hello")
            .resolve(Template::TileWidePeekImage05)
            .unwrap();

        assert_eq!(params, vec!["", "", "two.png", "", "hello", ""]);
    }

    #[test]
    fn test_named_rejects_unknown_slot() {
        let err = TemplateParams::named()
            .text(3, "extra")
            .resolve(Template::ToastText02)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The ToastText02 WNS notification type has no text3 field."
        );

        let err = TemplateParams::named()
            .image(1, "a.png", "a")
            .resolve(Template::ToastText01)
            .unwrap_err();
        assert!(err.to_string().contains("image1src"));

        let err = TemplateParams::named()
            .image_alt(2, "only alt")
            .resolve(Template::TileWideImageAndText01)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The TileWideImageAndText01 WNS notification type has no image2alt field."
        );
    }

    #[test]
    fn test_named_and_positional_agree() {
        let named = TemplateParams::named()
            .image(1, "a.png", "A")
            .text(1, "one")
            .text(2, "two")
            .resolve(Template::ToastImageAndText02)
            .unwrap();
        let positional = TemplateParams::positional(["a.png", "A", "one", "two"])
            .resolve(Template::ToastImageAndText02)
            .unwrap();

        assert_eq!(named, positional);
    }
}
