//! Case and namespace adjustments of foreign (SVG and MathML) elements.
//!
//! The tokenizer lowercases every name, so the mixed-case SVG names are
//! restored from these tables. They are built once by the owner of the
//! parser and shared by reference.
use crate::html::AttributeNamespace;
use crate::token::Attribute;
use hashbrown::HashMap;

static SVG_TAG_NAMES: &[&str] = &[
    "altGlyph",
    "altGlyphDef",
    "altGlyphItem",
    "animateColor",
    "animateMotion",
    "animateTransform",
    "clipPath",
    "feBlend",
    "feColorMatrix",
    "feComponentTransfer",
    "feComposite",
    "feConvolveMatrix",
    "feDiffuseLighting",
    "feDisplacementMap",
    "feDistantLight",
    "feDropShadow",
    "feFlood",
    "feFuncA",
    "feFuncB",
    "feFuncG",
    "feFuncR",
    "feGaussianBlur",
    "feImage",
    "feMerge",
    "feMergeNode",
    "feMorphology",
    "feOffset",
    "fePointLight",
    "feSpecularLighting",
    "feSpotLight",
    "feTile",
    "feTurbulence",
    "foreignObject",
    "glyphRef",
    "linearGradient",
    "radialGradient",
    "textPath",
];

static SVG_ATTRIBUTE_NAMES: &[&str] = &[
    "attributeName",
    "attributeType",
    "baseFrequency",
    "baseProfile",
    "calcMode",
    "clipPathUnits",
    "diffuseConstant",
    "edgeMode",
    "filterUnits",
    "glyphRef",
    "gradientTransform",
    "gradientUnits",
    "kernelMatrix",
    "kernelUnitLength",
    "keyPoints",
    "keySplines",
    "keyTimes",
    "lengthAdjust",
    "limitingConeAngle",
    "markerHeight",
    "markerUnits",
    "markerWidth",
    "maskContentUnits",
    "maskUnits",
    "numOctaves",
    "pathLength",
    "patternContentUnits",
    "patternTransform",
    "patternUnits",
    "pointsAtX",
    "pointsAtY",
    "pointsAtZ",
    "preserveAlpha",
    "preserveAspectRatio",
    "primitiveUnits",
    "refX",
    "refY",
    "repeatCount",
    "repeatDur",
    "requiredExtensions",
    "requiredFeatures",
    "specularConstant",
    "specularExponent",
    "spreadMethod",
    "startOffset",
    "stdDeviation",
    "stitchTiles",
    "surfaceScale",
    "systemLanguage",
    "tableValues",
    "targetX",
    "targetY",
    "textLength",
    "viewBox",
    "viewTarget",
    "xChannelSelector",
    "yChannelSelector",
    "zoomAndPan",
];

static MATH_ML_ATTRIBUTE_NAMES: &[&str] = &["definitionURL"];

static FOREIGN_ATTRIBUTES: &[(&str, AttributeNamespace)] = &[
    ("xlink:actuate", AttributeNamespace::XLink),
    ("xlink:arcrole", AttributeNamespace::XLink),
    ("xlink:href", AttributeNamespace::XLink),
    ("xlink:role", AttributeNamespace::XLink),
    ("xlink:show", AttributeNamespace::XLink),
    ("xlink:title", AttributeNamespace::XLink),
    ("xlink:type", AttributeNamespace::XLink),
    ("xml:lang", AttributeNamespace::Xml),
    ("xml:space", AttributeNamespace::Xml),
    ("xmlns", AttributeNamespace::Xmlns),
    ("xmlns:xlink", AttributeNamespace::Xmlns),
];

type CaseMap = HashMap<Box<str>, &'static str>;

fn case_map(names: &[&'static str]) -> CaseMap {
    names
        .iter()
        .map(|&name| (name.to_ascii_lowercase().into_boxed_str(), name))
        .collect()
}

fn adjust_attribute_names(map: &CaseMap, attributes: &mut [Attribute]) {
    for attr in attributes {
        if let Some(&adjusted) = map.get(attr.name.as_str()) {
            attr.name.clear();
            attr.name.push_str(adjusted);
        }
    }
}

#[derive(Debug)]
pub struct ForeignNameTables {
    svg_tags: CaseMap,
    svg_attributes: CaseMap,
    math_ml_attributes: CaseMap,
    foreign_attributes: HashMap<&'static str, AttributeNamespace>,
}

impl Default for ForeignNameTables {
    #[inline]
    fn default() -> Self {
        ForeignNameTables::new()
    }
}

impl ForeignNameTables {
    pub fn new() -> Self {
        ForeignNameTables {
            svg_tags: case_map(SVG_TAG_NAMES),
            svg_attributes: case_map(SVG_ATTRIBUTE_NAMES),
            math_ml_attributes: case_map(MATH_ML_ATTRIBUTE_NAMES),
            foreign_attributes: FOREIGN_ATTRIBUTES.iter().copied().collect(),
        }
    }

    /// Mixed-case form of an SVG tag name, if it has one.
    #[inline]
    pub fn svg_tag_name(&self, name: &str) -> Option<&'static str> {
        self.svg_tags.get(name).copied()
    }

    #[inline]
    pub fn adjust_svg_attributes(&self, attributes: &mut [Attribute]) {
        adjust_attribute_names(&self.svg_attributes, attributes);
    }

    #[inline]
    pub fn adjust_math_ml_attributes(&self, attributes: &mut [Attribute]) {
        adjust_attribute_names(&self.math_ml_attributes, attributes);
    }

    pub fn adjust_foreign_attributes(&self, attributes: &mut [Attribute]) {
        for attr in attributes {
            if let Some(&ns) = self.foreign_attributes.get(attr.name.as_str()) {
                attr.namespace = ns;
            }
        }
    }
}
