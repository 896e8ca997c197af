//! Inline `style` attribute parsing and editing.
//!
//! Declarations are kept in source order as raw `(property, value)` pairs so
//! that rewriting one property leaves every other declaration byte-identical.

use std::fmt;

use cssparser::{
    AtRuleParser, DeclarationParser, ParseError, Parser, ParserInput, QualifiedRuleParser,
    RuleBodyItemParser, RuleBodyParser, Token,
};

use super::arena::{ArenaDom, NodeId};

/// Ordered list of inline declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    /// Parse the contents of a `style` attribute. Invalid declarations are dropped.
    pub fn parse(style_attr: &str) -> Self {
        let mut declarations = Vec::new();
        let mut input = ParserInput::new(style_attr);
        let mut parser = Parser::new(&mut input);
        let mut decl_parser = InlineDeclarationParser {
            declarations: &mut declarations,
        };
        for result in RuleBodyParser::new(&mut parser, &mut decl_parser) {
            // Lenient: skip anything that is not a declaration.
            let _ = result;
        }
        Self { declarations }
    }

    /// Read the inline style of an element.
    pub fn of(dom: &ArenaDom, node: NodeId) -> Self {
        dom.attr(node, "style").map(Self::parse).unwrap_or_default()
    }

    /// Write this style back onto an element, removing the attribute when empty.
    pub fn write_to(&self, dom: &mut ArenaDom, node: NodeId) {
        if self.is_empty() {
            dom.remove_attr(node, "style");
        } else {
            dom.set_attr(node, "style", self.to_string());
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value.as_str())
    }

    /// Set a property, keeping its position if it already exists.
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .declarations
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
        {
            Some((_, existing)) => *existing = value,
            None => self.declarations.push((property.to_string(), value)),
        }
    }

    /// Remove a property. Returns whether it was present.
    pub fn remove(&mut self, property: &str) -> bool {
        let before = self.declarations.len();
        self.declarations
            .retain(|(name, _)| !name.eq_ignore_ascii_case(property));
        self.declarations.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}: {value};")?;
        }
        Ok(())
    }
}

/// Set one inline property on an element.
pub fn set_style_property(dom: &mut ArenaDom, node: NodeId, property: &str, value: &str) {
    let mut style = InlineStyle::of(dom, node);
    style.set(property, value);
    style.write_to(dom, node);
}

/// Remove inline properties from an element.
pub fn remove_style_properties(dom: &mut ArenaDom, node: NodeId, properties: &[&str]) {
    if dom.attr(node, "style").is_none() {
        return;
    }
    let mut style = InlineStyle::of(dom, node);
    let mut changed = false;
    for property in properties {
        changed |= style.remove(property);
    }
    if changed {
        style.write_to(dom, node);
    }
}

struct InlineDeclarationParser<'a> {
    declarations: &'a mut Vec<(String, String)>,
}

impl<'i> AtRuleParser<'i> for InlineDeclarationParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for InlineDeclarationParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();
}

impl<'i> DeclarationParser<'i> for InlineDeclarationParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &cssparser::ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next().is_ok() {}
        let value = input.slice_from(start).trim();
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }
        self.declarations
            .push((name.to_ascii_lowercase(), value.to_string()));
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for InlineDeclarationParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// An sRGB color with alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }
}

/// Parse a CSS color value (named, hex, `rgb()`, `rgba()`).
pub fn parse_color(value: &str) -> Option<Rgba> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);

    if let Ok(ident) = parser.try_parse(|i| i.expect_ident_cloned()) {
        return named_color(&ident.to_ascii_lowercase());
    }

    // cssparser yields IDHash or Hash depending on whether the first digit is a letter.
    if let Ok(hash) = parser.try_parse(|i| -> Result<_, ParseError<'_, ()>> {
        match i.next()? {
            Token::IDHash(h) | Token::Hash(h) => Ok(h.clone()),
            _ => Err(i.new_custom_error(())),
        }
    }) {
        return parse_hex_color(hash.as_ref());
    }

    parser.try_parse(parse_rgb_function).ok()
}

fn named_color(name: &str) -> Option<Rgba> {
    let color = match name {
        "black" => Rgba::rgb(0, 0, 0),
        "white" => Rgba::rgb(255, 255, 255),
        "red" => Rgba::rgb(255, 0, 0),
        "green" => Rgba::rgb(0, 128, 0),
        "blue" => Rgba::rgb(0, 0, 255),
        "navy" => Rgba::rgb(0, 0, 128),
        "gray" | "grey" => Rgba::rgb(128, 128, 128),
        "darkgray" | "darkgrey" => Rgba::rgb(169, 169, 169),
        "dimgray" | "dimgrey" => Rgba::rgb(105, 105, 105),
        "lightgray" | "lightgrey" => Rgba::rgb(211, 211, 211),
        "silver" => Rgba::rgb(192, 192, 192),
        "gainsboro" => Rgba::rgb(220, 220, 220),
        "whitesmoke" => Rgba::rgb(245, 245, 245),
        "transparent" => Rgba {
            r: 0,
            g: 0,
            b: 0,
            alpha: 0.0,
        },
        _ => return None,
    };
    Some(color)
}

fn parse_hex_color(hex: &str) -> Option<Rgba> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => Some(Rgba::rgb(
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
        )),
        6 => Some(Rgba::rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        8 => Some(Rgba {
            r: channel(&hex[0..2])?,
            g: channel(&hex[2..4])?,
            b: channel(&hex[4..6])?,
            alpha: f32::from(channel(&hex[6..8])?) / 255.0,
        }),
        _ => None,
    }
}

fn parse_rgb_function<'i>(input: &mut Parser<'i, '_>) -> Result<Rgba, ParseError<'i, ()>> {
    let location = input.current_source_location();
    let name = input.expect_function()?.clone();
    if !name.eq_ignore_ascii_case("rgb") && !name.eq_ignore_ascii_case("rgba") {
        return Err(location.new_custom_error(()));
    }
    input.parse_nested_block(|input| {
        let r = parse_color_component(input)?;
        input.expect_comma()?;
        let g = parse_color_component(input)?;
        input.expect_comma()?;
        let b = parse_color_component(input)?;
        let alpha = match input.try_parse(|i| i.expect_comma()) {
            Ok(()) => parse_alpha(input)?,
            Err(_) => 1.0,
        };
        Ok(Rgba { r, g, b, alpha })
    })
}

fn parse_color_component<'i>(input: &mut Parser<'i, '_>) -> Result<u8, ParseError<'i, ()>> {
    let location = input.current_source_location();
    match input.next()? {
        Token::Number { value, .. } => Ok(value.round().clamp(0.0, 255.0) as u8),
        Token::Percentage { unit_value, .. } => {
            Ok((unit_value * 255.0).round().clamp(0.0, 255.0) as u8)
        }
        _ => Err(location.new_custom_error(())),
    }
}

fn parse_alpha<'i>(input: &mut Parser<'i, '_>) -> Result<f32, ParseError<'i, ()>> {
    let location = input.current_source_location();
    match input.next()? {
        Token::Number { value, .. } => Ok(value.clamp(0.0, 1.0)),
        Token::Percentage { unit_value, .. } => Ok(unit_value.clamp(0.0, 1.0)),
        _ => Err(location.new_custom_error(())),
    }
}
