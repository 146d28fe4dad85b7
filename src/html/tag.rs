//! Precalculated local name hashes of the tag names the parser needs to
//! recognize. See `LocalNameHash` for the hashing algorithm.

macro_rules! declare_tags {
    ($($tag:ident = $hash:literal => $name:literal,)+) => {
        // NOTE: unfortunately `const fn` can't be used to calculate enum
        // discriminants, so we need to use manually precalculated values.
        // Consistency between the hashing algorithm and these values is
        // guaranteed by the dedicated test.
        #[repr(u64)]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum Tag {
            $($tag = $hash,)+
        }

        impl Tag {
            /// Lowercase local name of the tag.
            pub fn name(self) -> &'static str {
                match self {
                    $(Tag::$tag => $name,)+
                }
            }
        }

        #[cfg(test)]
        pub(crate) static ALL_TAGS: &[Tag] = &[$(Tag::$tag,)+];
    };
}

declare_tags! {
    A = 6u64 => "a",
    Address = 6_754_642_712u64 => "address",
    Annotation = 232_672_109_312_659u64 => "annotation",
    Applet = 224_052_569u64 => "applet",
    Area = 220_486u64 => "area",
    Article = 7_240_884_778u64 => "article",
    Aside = 7_092_522u64 => "aside",
    B = 7u64 => "b",
    Base = 236_298u64 => "base",
    Basefont = 247_776_793_209u64 => "basefont",
    Bgsound = 7_944_694_377u64 => "bgsound",
    Big = 7_628u64 => "big",
    Blockquote = 265_678_647_808_810u64 => "blockquote",
    Body = 250_174u64 => "body",
    Br = 247u64 => "br",
    Button = 262_989_459u64 => "button",
    Caption = 8_814_115_475u64 => "caption",
    Center = 279_569_751u64 => "center",
    Code = 282_922u64 => "code",
    Col = 8_849u64 => "col",
    Colgroup = 296_936_526_677u64 => "colgroup",
    Command = 9_280_494_185u64 => "command",
    Dd = 297u64 => "dd",
    Desc = 305_928u64 => "desc",
    Details = 10_025_646_648u64 => "details",
    Dialog = 316_884_620u64 => "dialog",
    Dir = 9_687u64 => "dir",
    Div = 9_691u64 => "div",
    Dl = 305u64 => "dl",
    Dt = 313u64 => "dt",
    Em = 338u64 => "em",
    Embed = 11_083_081u64 => "embed",
    Fieldset = 393_343_197_529u64 => "fieldset",
    Figcaption = 402_842_386_741_907u64 => "figcaption",
    Figure = 384_199_402u64 => "figure",
    Font = 381_561u64 => "font",
    Footer = 390_751_575u64 => "footer",
    ForeignObject = 13_428_975_859_192_539_417u64 => "foreignobject",
    Form = 381_682u64 => "form",
    Frame = 12_294_730u64 => "frame",
    Frameset = 402_873_737_561u64 => "frameset",
    H1 = 416u64 => "h1",
    H2 = 417u64 => "h2",
    H3 = 418u64 => "h3",
    H4 = 419u64 => "h4",
    H5 = 420u64 => "h5",
    H6 = 421u64 => "h6",
    Head = 436_425u64 => "head",
    Header = 446_899_543u64 => "header",
    Hgroup = 449_565_525u64 => "hgroup",
    Hr = 439u64 => "hr",
    Html = 452_177u64 => "html",
    I = 14u64 => "i",
    Iframe = 482_056_778u64 => "iframe",
    Image = 15_276_426u64 => "image",
    Img = 14_924u64 => "img",
    Input = 15_325_017u64 => "input",
    Isindex = 15_853_004_125u64 => "isindex",
    Keygen = 548_352_339u64 => "keygen",
    Li = 558u64 => "li",
    Link = 572_016u64 => "link",
    Listing = 18_749_373_036u64 => "listing",
    Main = 596_435u64 => "main",
    MalignMark = 640_515_338_476_272u64 => "malignmark",
    Marquee = 19_553_544_522u64 => "marquee",
    Math = 596_781u64 => "math",
    Menu = 600_698u64 => "menu",
    Meta = 600_870u64 => "meta",
    Mglyph = 617_151_149u64 => "mglyph",
    Mi = 590u64 => "mi",
    Mn = 595u64 => "mn",
    Mo = 596u64 => "mo",
    Ms = 600u64 => "ms",
    Mtext = 19_704_761u64 => "mtext",
    Nav = 19_675u64 => "nav",
    Nobr = 643_319u64 => "nobr",
    Noembed = 21_083_266_377u64 => "noembed",
    Noframes = 674_703_296_856u64 => "noframes",
    Noscript = 675_124_329_145u64 => "noscript",
    Object = 678_930_713u64 => "object",
    Ol = 657u64 => "ol",
    Optgroup = 710_595_564_373u64 => "optgroup",
    Option = 693_942_931u64 => "option",
    P = 21u64 => "p",
    Param = 22_240_466u64 => "param",
    Plaintext = 23_680_792_701_881u64 => "plaintext",
    Pre = 22_250u64 => "pre",
    Rb = 743u64 => "rb",
    Rp = 757u64 => "rp",
    Rt = 761u64 => "rt",
    Rtc = 24_360u64 => "rtc",
    Ruby = 780_542u64 => "ruby",
    S = 24u64 => "s",
    Script = 814_463_673u64 => "script",
    Section = 26_114_570_899u64 => "section",
    Select = 816_359_705u64 => "select",
    Small = 25_762_353u64 => "small",
    Source = 827_153_674u64 => "source",
    Span = 808_147u64 => "span",
    Strike = 832_289_290u64 => "strike",
    Strong = 832_295_532u64 => "strong",
    Style = 26_016_298u64 => "style",
    Sub = 25_415u64 => "sub",
    Summary = 26_661_690_110u64 => "summary",
    Sup = 25_429u64 => "sup",
    Svg = 25_452u64 => "svg",
    Table = 26_418_730u64 => "table",
    Tbody = 26_464_574u64 => "tbody",
    Td = 809u64 => "td",
    Template = 870_357_441_322u64 => "template",
    Textarea = 870_730_390_854u64 => "textarea",
    Tfoot = 26_595_993u64 => "tfoot",
    Th = 813u64 => "th",
    Thead = 26_650_825u64 => "thead",
    Title = 26_699_306u64 => "title",
    Tr = 823u64 => "tr",
    Track = 26_974_480u64 => "track",
    Tt = 825u64 => "tt",
    U = 26u64 => "u",
    Ul = 849u64 => "ul",
    Var = 27_863u64 => "var",
    Wbr = 28_919u64 => "wbr",
    Xmp = 30_293u64 => "xmp",
}

macro_rules! tag_is_one_of {
    ($hash:expr, [$($tag:ident),+]) => {
        $($hash == $crate::html::Tag::$tag)||+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::LocalNameHash;

    #[test]
    fn precalculated_hashes_match_hashing_algorithm() {
        for &tag in ALL_TAGS {
            assert_eq!(LocalNameHash::from(tag.name()), tag, "{}", tag.name());
        }
    }

    #[test]
    fn tag_is_one_of_macro() {
        let hash = LocalNameHash::from("TBody");

        assert!(tag_is_one_of!(hash, [Thead, Tbody, Tfoot]));
        assert!(!tag_is_one_of!(hash, [Table, Tr]));
    }
}
