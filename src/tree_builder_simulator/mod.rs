//! The tokenizer has several text parsing states and the switch between them
//! is normally performed by the tree builder, depending on the stack of open
//! elements (HTML is a context-sensitive grammar).
//!
//! The background thread doesn't have the tree builder, but in the majority
//! of cases its feedback can be simulated with a coarse model of the stack
//! of open elements: the document content, SVG and MathML elements (tracked
//! by name, since tree construction of foreign content is simple) and the
//! HTML content of integration points. This module implements such a
//! simulation. It never touches the document and tells the background
//! parser when speculation can't safely continue: on scripts, which can
//! rewrite the document when executed, and in the contexts where the
//! outcome depends on the real tree builder (see `AmbiguityGuard` and
//! `AmbiguityGuardError::UnpredictableForeignContentTag`).
mod ambiguity_guard;

use self::ambiguity_guard::{AmbiguityGuard, GuardState};
use crate::html::{causes_foreign_content_exit, LocalNameHash, Namespace, Tag};
use crate::token::CompactToken;
use crate::tokenizer::{TokenKind, Tokenizer};
use crate::tree_builder::{InsertionMode, TreeBuilder, TreeSink};
use log::debug;

pub use self::ambiguity_guard::AmbiguityGuardError;

const DEFAULT_FRAME_STACK_CAPACITY: usize = 16;

#[inline]
fn is_text_integration_point_in_math_ml(tag_name_hash: LocalNameHash) -> bool {
    tag_is_one_of!(tag_name_hash, [Mi, Mo, Mn, Ms, Mtext])
}

#[inline]
fn is_html_integration_point_in_svg(tag_name_hash: LocalNameHash) -> bool {
    tag_is_one_of!(tag_name_hash, [Desc, Title, ForeignObject])
}

fn is_html_annotation_xml(token: &CompactToken) -> bool {
    token.data().eq_ignore_ascii_case("annotation-xml")
        && token.attributes().iter().any(|attr| {
            attr.name.as_str() == "encoding"
                && (attr.value.eq_ignore_ascii_case("text/html")
                    || attr.value.eq_ignore_ascii_case("application/xhtml+xml"))
        })
}

fn has_font_breakout_attributes(token: &CompactToken) -> bool {
    token
        .attributes()
        .iter()
        .any(|attr| matches!(attr.name.as_str(), "color" | "face" | "size"))
}

fn tag_source(token: &CompactToken) -> String {
    match token.kind() {
        TokenKind::EndTag => format!("</{}>", token.data()),
        _ => format!("<{}>", token.data()),
    }
}

/// A run of the stack of open elements whose content is parsed the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    /// The document itself. Tags in it are processed by the insertion mode.
    Document,
    /// HTML content of an integration point (`<foreignObject>`, `<mi>`,
    /// etc.). As long as no HTML element is open in it, the integration
    /// point itself is the current node.
    IntegrationPoint { has_html_elements: bool },
    /// SVG or MathML elements, with lowercased names from the bottom up.
    Foreign {
        ns: Namespace,
        elements: Vec<Box<str>>,
    },
}

impl Frame {
    #[inline]
    fn namespace(&self) -> Namespace {
        match self {
            Frame::Foreign { ns, .. } => *ns,
            _ => Namespace::Html,
        }
    }
}

fn open_element(frames: &mut Vec<Frame>, ns: Namespace, name: &str) {
    if ns == Namespace::Html {
        match frames.last_mut() {
            Some(Frame::IntegrationPoint { has_html_elements }) => *has_html_elements = true,
            Some(Frame::Foreign { .. }) => frames.push(Frame::IntegrationPoint {
                has_html_elements: true,
            }),
            _ => (),
        }

        return;
    }

    let name = name.to_ascii_lowercase().into_boxed_str();

    if let Some(Frame::Foreign {
        ns: frame_ns,
        elements,
    }) = frames.last_mut()
    {
        if *frame_ns == ns {
            elements.push(name);
            return;
        }
    }

    frames.push(Frame::Foreign {
        ns,
        elements: vec![name],
    });
}

/// A snapshot of the simulator that can be compared with the state derived
/// from the real tree builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorState {
    frames: Vec<Frame>,
    guard: GuardState,
}

impl SimulatorState {
    /// Namespaces of the content the open elements are parsed in, from the
    /// document to the current node.
    pub fn namespace_stack(&self) -> Vec<Namespace> {
        self.frames.iter().map(Frame::namespace).collect()
    }
}

impl Default for SimulatorState {
    #[inline]
    fn default() -> Self {
        SimulatorState {
            frames: vec![Frame::Document],
            guard: GuardState::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeBuilderSimulator {
    frames: Vec<Frame>,
    ambiguity_guard: AmbiguityGuard,
    ambiguity: Option<AmbiguityGuardError>,
}

impl Default for TreeBuilderSimulator {
    #[inline]
    fn default() -> Self {
        TreeBuilderSimulator::from_state(&SimulatorState::default())
    }
}

impl TreeBuilderSimulator {
    pub fn from_state(state: &SimulatorState) -> Self {
        let mut frames = Vec::with_capacity(DEFAULT_FRAME_STACK_CAPACITY);

        frames.extend_from_slice(&state.frames);

        if frames.is_empty() {
            frames.push(Frame::Document);
        }

        TreeBuilderSimulator {
            frames,
            ambiguity_guard: AmbiguityGuard::new(state.guard),
            ambiguity: None,
        }
    }

    pub fn state(&self) -> SimulatorState {
        SimulatorState {
            frames: self.frames.clone(),
            guard: self.ambiguity_guard.state(),
        }
    }

    /// Derives the simulator state the real tree builder is in.
    pub fn state_for<S: TreeSink>(tree_builder: &TreeBuilder<S>) -> SimulatorState {
        let mut frames = vec![Frame::Document];
        let mut templates_after_select = None;

        for (ns, name, content_is_html) in tree_builder.open_element_namespaces() {
            open_element(&mut frames, ns, name);

            if content_is_html {
                frames.push(Frame::IntegrationPoint {
                    has_html_elements: false,
                });
            }

            if ns == Namespace::Html {
                let hash = LocalNameHash::from(name);

                if hash == Tag::Select {
                    templates_after_select = Some(0u8);
                } else if hash == Tag::Template {
                    templates_after_select = templates_after_select.map(|n| n.saturating_add(1));
                }
            }
        }

        let mode = match tree_builder.insertion_mode() {
            InsertionMode::Text | InsertionMode::InTableText => {
                tree_builder.original_insertion_mode()
            }
            mode => mode,
        };

        let guard = match mode {
            InsertionMode::InSelect | InsertionMode::InSelectInTable => GuardState::InSelect,
            InsertionMode::InFrameset
            | InsertionMode::AfterFrameset
            | InsertionMode::AfterAfterFrameset => GuardState::InOrAfterFrameset,
            _ => match templates_after_select {
                Some(depth) if depth > 0 => GuardState::InTemplateInSelect(depth),
                _ => GuardState::Default,
            },
        };

        SimulatorState { frames, guard }
    }

    /// The reason of the last stop, if the stop was caused by an ambiguity
    /// rather than a script.
    #[inline]
    pub fn take_ambiguity(&mut self) -> Option<AmbiguityGuardError> {
        self.ambiguity.take()
    }

    /// Whether the tree builder would see an SVG or MathML element as the
    /// adjusted current node.
    #[inline]
    fn current_node_is_foreign(&self) -> bool {
        matches!(
            self.frames.last(),
            Some(Frame::Foreign { .. })
                | Some(Frame::IntegrationPoint {
                    has_html_elements: false
                })
        )
    }

    fn stop(&mut self, ambiguity: AmbiguityGuardError) -> bool {
        debug!("Speculation stopped: {ambiguity}");
        self.ambiguity = Some(ambiguity);

        false
    }

    #[inline]
    fn stop_on_unpredictable_tag(&mut self, token: &CompactToken) -> bool {
        self.stop(AmbiguityGuardError::UnpredictableForeignContentTag {
            tag: tag_source(token),
        })
    }

    /// Advances the simulation by one token and adjusts the tokenizer the
    /// way the tree builder would. Returns `false` if speculation must stop
    /// after this token.
    pub fn simulate(&mut self, token: &CompactToken, tokenizer: &mut Tokenizer) -> bool {
        let can_continue = match token.kind() {
            TokenKind::StartTag => self.simulate_start_tag(token, tokenizer),
            TokenKind::EndTag => self.simulate_end_tag(token),
            _ => true,
        };

        let in_foreign_content = self.current_node_is_foreign();

        tokenizer.set_force_null_character_replacement(in_foreign_content);
        tokenizer.set_should_allow_cdata(in_foreign_content);

        can_continue
    }

    fn simulate_start_tag(&mut self, token: &CompactToken, tokenizer: &mut Tokenizer) -> bool {
        let hash = LocalNameHash::from(token.data());

        let can_continue = match self.frames.last() {
            Some(Frame::Foreign { ns, elements }) => {
                let ns = *ns;
                let in_annotation_xml = elements
                    .last()
                    .is_some_and(|name| &**name == "annotation-xml");

                self.simulate_start_tag_in_foreign_content(
                    token,
                    hash,
                    ns,
                    in_annotation_xml,
                    tokenizer,
                )
            }
            Some(Frame::IntegrationPoint {
                has_html_elements: false,
            }) => self.simulate_start_tag_in_integration_point(token, hash),
            // NOTE: the insertion mode decides what HTML elements in an
            // integration point close, so we can't follow it.
            Some(Frame::IntegrationPoint { .. }) => self.stop_on_unpredictable_tag(token),
            Some(Frame::Document) | None => {
                self.simulate_start_tag_in_document(token, hash, tokenizer)
            }
        };

        can_continue && hash != Tag::Script
    }

    fn simulate_start_tag_in_document(
        &mut self,
        token: &CompactToken,
        hash: LocalNameHash,
        tokenizer: &mut Tokenizer,
    ) -> bool {
        if let Err(e) = self.ambiguity_guard.track_start_tag(hash) {
            return self.stop(e);
        }

        if hash == Tag::Svg || hash == Tag::Math {
            self.open_foreign_root(token, hash);
        } else {
            tokenizer.update_state_for(token.data());
        }

        true
    }

    fn open_foreign_root(&mut self, token: &CompactToken, hash: LocalNameHash) {
        if !token.self_closing() {
            let ns = if hash == Tag::Svg {
                Namespace::Svg
            } else {
                Namespace::MathML
            };

            open_element(&mut self.frames, ns, token.data());
        }
    }

    fn simulate_start_tag_in_integration_point(
        &mut self,
        token: &CompactToken,
        hash: LocalNameHash,
    ) -> bool {
        let in_math_ml_text_integration_point = self.frames.len() > 1
            && match &self.frames[self.frames.len() - 2] {
                Frame::Foreign {
                    ns: Namespace::MathML,
                    elements,
                } => elements.last().is_some_and(|name| {
                    is_text_integration_point_in_math_ml(LocalNameHash::from(&**name))
                }),
                _ => false,
            };

        if hash == Tag::Svg || hash == Tag::Math {
            self.open_foreign_root(token, hash);

            true
        } else if in_math_ml_text_integration_point && tag_is_one_of!(hash, [Mglyph, MalignMark])
        {
            if !token.self_closing() {
                open_element(&mut self.frames, Namespace::MathML, token.data());
            }

            true
        } else {
            // NOTE: assume the element stays open until the consumer tells
            // us otherwise.
            open_element(&mut self.frames, Namespace::Html, token.data());

            self.stop_on_unpredictable_tag(token)
        }
    }

    fn simulate_start_tag_in_foreign_content(
        &mut self,
        token: &CompactToken,
        hash: LocalNameHash,
        ns: Namespace,
        in_annotation_xml: bool,
        tokenizer: &mut Tokenizer,
    ) -> bool {
        if causes_foreign_content_exit(hash)
            || (hash == Tag::Font && has_font_breakout_attributes(token))
        {
            while matches!(self.frames.last(), Some(Frame::Foreign { .. })) {
                self.frames.pop();
            }

            // NOTE: the tag is reprocessed in the HTML content the foreign
            // elements were in.
            return match self.frames.last() {
                Some(Frame::Document) | None => {
                    self.simulate_start_tag_in_document(token, hash, tokenizer)
                }
                _ => self.stop_on_unpredictable_tag(token),
            };
        }

        if token.self_closing() {
            return true;
        }

        if ns == Namespace::MathML && hash == Tag::Svg && in_annotation_xml {
            open_element(&mut self.frames, Namespace::Svg, token.data());

            return true;
        }

        open_element(&mut self.frames, ns, token.data());

        let is_integration_point = match ns {
            Namespace::Svg => is_html_integration_point_in_svg(hash),
            _ => is_text_integration_point_in_math_ml(hash) || is_html_annotation_xml(token),
        };

        if is_integration_point {
            self.frames.push(Frame::IntegrationPoint {
                has_html_elements: false,
            });
        }

        true
    }

    fn simulate_end_tag(&mut self, token: &CompactToken) -> bool {
        let hash = LocalNameHash::from(token.data());

        let can_continue = match self.frames.last() {
            Some(Frame::Document) | None => {
                self.ambiguity_guard.track_end_tag(hash);
                true
            }
            Some(Frame::IntegrationPoint {
                has_html_elements: true,
            }) => self.stop_on_unpredictable_tag(token),
            _ => self.simulate_end_tag_in_foreign_content(token),
        };

        // NOTE: scripts in any namespace run when their end tag is processed.
        can_continue && hash != Tag::Script
    }

    /// Pops the innermost foreign element with the end tag's name. If an
    /// HTML element is reached first, the end tag is processed by the
    /// insertion mode, which can close foreign content in ways we don't
    /// follow.
    fn simulate_end_tag_in_foreign_content(&mut self, token: &CompactToken) -> bool {
        let name = token.data();

        for frame_idx in (0..self.frames.len()).rev() {
            match &self.frames[frame_idx] {
                Frame::Foreign { elements, .. } => {
                    let Some(element_idx) = elements
                        .iter()
                        .rposition(|element| element.eq_ignore_ascii_case(name))
                    else {
                        continue;
                    };

                    self.frames.truncate(frame_idx + 1);

                    if let Some(Frame::Foreign { elements, .. }) = self.frames.last_mut() {
                        elements.truncate(element_idx);

                        if elements.is_empty() {
                            self.frames.pop();
                        }
                    }

                    return true;
                }
                Frame::IntegrationPoint {
                    has_html_elements: false,
                } => (),
                _ => break,
            }
        }

        self.stop_on_unpredictable_tag(token)
    }
}
