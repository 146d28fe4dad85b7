#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathML,
}

impl Namespace {
    #[inline]
    pub fn uri(self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathML => "http://www.w3.org/1998/Math/MathML",
        }
    }
}

/// Namespaces that attributes can be moved into by the foreign
/// attributes adjustment.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub enum AttributeNamespace {
    #[default]
    None,
    XLink,
    Xml,
    Xmlns,
}

impl AttributeNamespace {
    #[inline]
    pub fn uri(self) -> Option<&'static str> {
        match self {
            AttributeNamespace::None => None,
            AttributeNamespace::XLink => Some("http://www.w3.org/1999/xlink"),
            AttributeNamespace::Xml => Some("http://www.w3.org/XML/1998/namespace"),
            AttributeNamespace::Xmlns => Some("http://www.w3.org/2000/xmlns/"),
        }
    }
}
