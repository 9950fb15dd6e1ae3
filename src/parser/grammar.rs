//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::SyntaxError;
use crate::parser::ast::*;
use crate::parser::ast::Span;
use crate::parser::lexer::{lex_field, lex_template, FieldToken, Piece};

/// Parse a brace template into segments
pub fn parse(input: &str) -> Result<BraceTemplate, SyntaxError> {
    let mut segments: Vec<Spanned<Segment>> = Vec::new();

    for (piece, span) in lex_template(input) {
        let Ok(piece) = piece else {
            return Err(unmatched_brace(input, span));
        };
        match piece {
            Piece::Text => push_literal(&mut segments, &input[span.clone()], span),
            Piece::EscapedOpen => push_literal(&mut segments, "{", span),
            Piece::EscapedClose => push_literal(&mut segments, "}", span),
            Piece::Field => {
                let content = &input[span.start + 1..span.end - 1];
                let field = parse_field(content, span.start + 1)?;
                segments.push(Spanned::new(Segment::Field(field), span));
            }
        }
    }

    Ok(BraceTemplate { segments })
}

fn push_literal(segments: &mut Vec<Spanned<Segment>>, text: &str, span: Span) {
    if let Some(Spanned {
        node: Segment::Literal(existing),
        span: existing_span,
    }) = segments.last_mut()
    {
        existing.push_str(text);
        existing_span.end = span.end;
        return;
    }
    segments.push(Spanned::new(Segment::Literal(text.to_string()), span));
}

fn unmatched_brace(input: &str, span: Span) -> SyntaxError {
    let message = if input[span.clone()].starts_with('{') {
        "single '{' encountered; use '{{' for a literal brace"
    } else {
        "single '}' encountered; use '}}' for a literal brace"
    };
    SyntaxError::new(span, message)
}

/// Parse the text between the braces of a replacement field.
///
/// `offset` is the byte position of `content` in the template.
fn parse_field(content: &str, offset: usize) -> Result<Field, SyntaxError> {
    let (name, conversion, spec) = split_field(content, offset)?;

    let path = if name.is_empty() {
        FieldPath {
            root: FieldRoot::Positional(None),
            accessors: Vec::new(),
        }
    } else {
        parse_field_path(name).map_err(|e| e.offset(offset))?
    };

    let spec_offset = offset + content.len() - spec.len();
    let spec = parse_format_spec(spec).map_err(|e| e.offset(spec_offset))?;

    Ok(Field {
        source: content.to_string(),
        path,
        conversion,
        spec,
    })
}

/// Split `name!c:spec` into its parts. `:` and `!` inside brackets belong to the name.
fn split_field(
    content: &str,
    offset: usize,
) -> Result<(&str, Option<Conversion>, &str), SyntaxError> {
    let mut in_brackets = false;
    let mut name_end = content.len();
    for (i, c) in content.char_indices() {
        match c {
            '[' => in_brackets = true,
            ']' => in_brackets = false,
            '!' | ':' if !in_brackets => {
                name_end = i;
                break;
            }
            _ => {}
        }
    }

    let name = &content[..name_end];
    let rest = &content[name_end..];

    let Some(after_bang) = rest.strip_prefix('!') else {
        return Ok((name, None, rest.strip_prefix(':').unwrap_or(rest)));
    };

    let conversion_at = offset + name_end + 1;
    let mut chars = after_bang.chars();
    let conversion = match chars.next() {
        Some('s') => Conversion::Str,
        Some('r') => Conversion::Repr,
        Some('a') => Conversion::Ascii,
        Some(other) => {
            return Err(SyntaxError::new(
                conversion_at..conversion_at + other.len_utf8(),
                format!("unknown conversion specifier '{}'", other),
            ))
        }
        None => {
            return Err(SyntaxError::new(
                conversion_at..conversion_at,
                "end of field while looking for conversion specifier",
            ))
        }
    };

    let remainder = chars.as_str();
    if remainder.is_empty() {
        return Ok((name, Some(conversion), ""));
    }
    match remainder.strip_prefix(':') {
        Some(spec) => Ok((name, Some(conversion), spec)),
        None => Err(SyntaxError::new(
            conversion_at + 1..offset + content.len(),
            "expected ':' after conversion specifier",
        )),
    }
}

fn parse_field_path(name: &str) -> Result<FieldPath, SyntaxError> {
    let len = name.len();

    let mut tokens = Vec::new();
    for (token, span) in lex_field(name) {
        match token {
            Ok(token) => tokens.push((token, SimpleSpan::from(span))),
            Err(()) => {
                let message = format!("unexpected '{}' in field name", &name[span.clone()]);
                return Err(SyntaxError::new(span, message));
            }
        }
    }

    // Turn the token list into a stream that chumsky can use
    let token_stream = Stream::from_iter(tokens.into_iter())
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    field_path_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| {
            errs.into_iter()
                .next()
                .map(syntax_error)
                .unwrap_or_else(|| SyntaxError::new(0..len, "invalid field name"))
        })
}

fn syntax_error(err: Rich<'_, FieldToken>) -> SyntaxError {
    let message = match err.found() {
        Some(token) => format!("unexpected {} in field name", token),
        None => "unexpected end of field name".to_string(),
    };
    SyntaxError::new(err.span().into_range(), message)
}

fn field_path_parser<'a, I>() -> impl Parser<'a, I, FieldPath, extra::Err<Rich<'a, FieldToken>>> + Clone
where
    I: ValueInput<'a, Token = FieldToken, Span = SimpleSpan>,
{
    let root = select! {
        FieldToken::Ident(name) => FieldRoot::Named(name),
        FieldToken::Integer(index) => FieldRoot::Positional(Some(index)),
    };

    let attr = just(FieldToken::Dot).ignore_then(select! {
        FieldToken::Ident(name) => Accessor::Attr(name),
    });

    let item = select! {
        FieldToken::Integer(index) => Accessor::Index(index),
        FieldToken::Ident(key) => Accessor::Key(key),
    }
    .delimited_by(just(FieldToken::BracketOpen), just(FieldToken::BracketClose));

    root.then(choice((attr, item)).repeated().collect::<Vec<_>>())
        .then_ignore(end())
        .map(|(root, accessors)| FieldPath { root, accessors })
}

/// Parse `[[fill]align][sign][#][0][width][.precision][type]`
fn parse_format_spec(spec: &str) -> Result<FormatSpec, SyntaxError> {
    let chars: Vec<(usize, char)> = spec.char_indices().collect();
    let mut parsed = FormatSpec::default();
    let mut i = 0;

    let align_of = |c: char| match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::AfterSign),
        _ => None,
    };

    if let Some(align) = chars.get(1).and_then(|&(_, c)| align_of(c)) {
        parsed.fill = Some(chars[0].1);
        parsed.align = Some(align);
        i = 2;
    } else if let Some(align) = chars.first().and_then(|&(_, c)| align_of(c)) {
        parsed.align = Some(align);
        i = 1;
    }

    parsed.sign = match chars.get(i).map(|&(_, c)| c) {
        Some('+') => Some(Sign::Plus),
        Some('-') => Some(Sign::Minus),
        Some(' ') => Some(Sign::Space),
        _ => None,
    };
    if parsed.sign.is_some() {
        i += 1;
    }

    if chars.get(i).map(|&(_, c)| c) == Some('#') {
        parsed.alternate = true;
        i += 1;
    }
    if chars.get(i).map(|&(_, c)| c) == Some('0') {
        parsed.zero = true;
        i += 1;
    }

    let (width, next) = digits(&chars, i, spec.len())?;
    parsed.width = width;
    i = next;

    if let Some(&(at, c @ (',' | '_'))) = chars.get(i) {
        return Err(SyntaxError::new(
            at..at + 1,
            format!("grouping with '{}' is not supported", c),
        ));
    }

    if let Some(&(at, '.')) = chars.get(i) {
        let (precision, next) = digits(&chars, i + 1, spec.len())?;
        if precision.is_none() {
            return Err(SyntaxError::new(at..at + 1, "format specifier missing precision"));
        }
        parsed.precision = precision;
        i = next;
    }

    if let Some(&(at, c)) = chars.get(i) {
        parsed.format_type = Some(match c {
            's' => FormatType::Str,
            'd' => FormatType::Decimal,
            'x' => FormatType::HexLower,
            'X' => FormatType::HexUpper,
            'o' => FormatType::Octal,
            'b' => FormatType::Binary,
            'f' => FormatType::Fixed,
            'F' => FormatType::FixedUpper,
            '%' => FormatType::Percent,
            other => {
                return Err(SyntaxError::new(
                    at..at + other.len_utf8(),
                    format!("unknown format code '{}'", other),
                ))
            }
        });
        i += 1;
    }

    if let Some(&(at, _)) = chars.get(i) {
        return Err(SyntaxError::new(at..spec.len(), "invalid format specifier"));
    }

    Ok(parsed)
}

/// Largest width or precision a format spec may ask for
const MAX_FORMAT_NUMBER: usize = u16::MAX as usize;

/// Read a run of ASCII digits starting at `start`, at most [`MAX_FORMAT_NUMBER`]
fn digits(
    chars: &[(usize, char)],
    start: usize,
    spec_len: usize,
) -> Result<(Option<usize>, usize), SyntaxError> {
    let mut end = start;
    let mut value: Option<usize> = None;
    let mut too_large = false;
    while let Some(&(_, c)) = chars.get(end) {
        let Some(digit) = c.to_digit(10) else {
            break;
        };
        let next = value
            .unwrap_or(0)
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit as usize));
        match next {
            Some(v) if v <= MAX_FORMAT_NUMBER => value = Some(v),
            _ => too_large = true,
        }
        end += 1;
    }

    if too_large {
        let from = chars.get(start).map_or(spec_len, |&(at, _)| at);
        let to = chars.get(end).map_or(spec_len, |&(at, _)| at);
        return Err(SyntaxError::new(
            from..to,
            format!("too many decimal digits in format string (at most {})", MAX_FORMAT_NUMBER),
        ));
    }
    Ok((value, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn only_field(template: &BraceTemplate) -> &Field {
        template.fields().next().expect("template should have a field")
    }

    #[test]
    fn test_parse_literal_only() {
        let template = parse("plain text").expect("Should parse");
        assert_eq!(
            template.segments,
            vec![Spanned::new(Segment::Literal("plain text".to_string()), 0..10)]
        );
    }

    #[test]
    fn test_parse_escaped_braces_merge_into_literal() {
        let template = parse("{{literal}}").expect("Should parse");
        assert_eq!(
            template.segments,
            vec![Spanned::new(Segment::Literal("{literal}".to_string()), 0..11)]
        );
    }

    #[test]
    fn test_parse_simple_field() {
        let template = parse("list: {lst}.").expect("Should parse");
        assert_eq!(template.segments.len(), 3);
        let field = only_field(&template);
        assert_eq!(field.path.root, FieldRoot::Named("lst".to_string()));
        assert!(field.path.accessors.is_empty());
        assert_eq!(field.conversion, None);
        assert!(field.spec.is_empty());
        assert_eq!(template.segments[1].span, 6..11);
    }

    #[test]
    fn test_parse_accessors() {
        let template = parse("{user.emails[0][primary]}").expect("Should parse");
        let field = only_field(&template);
        assert_eq!(
            field.path,
            FieldPath {
                root: FieldRoot::Named("user".to_string()),
                accessors: vec![
                    Accessor::Attr("emails".to_string()),
                    Accessor::Index(0),
                    Accessor::Key("primary".to_string()),
                ],
            }
        );
    }

    #[test]
    fn test_parse_positional_fields() {
        let template = parse("{} {1}").expect("Should parse");
        let roots: Vec<_> = template.fields().map(|f| f.path.root.clone()).collect();
        assert_eq!(
            roots,
            vec![FieldRoot::Positional(None), FieldRoot::Positional(Some(1))]
        );
    }

    #[test]
    fn test_parse_conversion_and_spec() {
        let template = parse("{name!r:>10}").expect("Should parse");
        let field = only_field(&template);
        assert_eq!(field.conversion, Some(Conversion::Repr));
        assert_eq!(field.spec.align, Some(Align::Right));
        assert_eq!(field.spec.width, Some(10));
    }

    #[test]
    fn test_parse_full_format_spec() {
        let template = parse("{value:*^+#012.3f}").expect("Should parse");
        assert_eq!(
            only_field(&template).spec,
            FormatSpec {
                fill: Some('*'),
                align: Some(Align::Center),
                sign: Some(Sign::Plus),
                alternate: true,
                zero: true,
                width: Some(12),
                precision: Some(3),
                format_type: Some(FormatType::Fixed),
            }
        );
    }

    #[test]
    fn test_parse_colon_inside_brackets_belongs_to_name() {
        let result = parse("{a[b:c]}");
        // `b:c` is not a valid key in this grammar, but the split must not cut at ':'
        let err = result.expect_err("key with ':' is rejected");
        assert!(err.message.contains("':'"));
    }

    #[test]
    fn test_variable_names_first_occurrence_order() {
        let template = parse("{b} {a[0]} {b.x} {0}").expect("Should parse");
        assert_eq!(template.variable_names(), vec!["b", "a"]);
    }

    #[test]
    fn test_single_open_brace_error() {
        let err = parse("oops { here").expect_err("Should fail");
        assert!(err.message.contains("single '{'"));
        assert_eq!(err.span.start, 5);
    }

    #[test]
    fn test_single_close_brace_error() {
        let err = parse("oops } here").expect_err("Should fail");
        assert!(err.message.contains("single '}'"));
        assert_eq!(err.span, 5..6);
    }

    #[test]
    fn test_invalid_character_in_field_name() {
        let err = parse("x {a-b}").expect_err("Should fail");
        assert!(err.message.contains("'-'"));
        assert_eq!(err.span, 4..5);
    }

    #[test]
    fn test_dangling_dot_in_field_name() {
        assert!(parse("{a.}").is_err());
    }

    #[test]
    fn test_unknown_conversion() {
        let err = parse("{a!x}").expect_err("Should fail");
        assert!(err.message.contains("unknown conversion specifier 'x'"));
        assert_eq!(err.span, 3..4);
    }

    #[test]
    fn test_conversion_must_be_followed_by_colon() {
        let err = parse("{a!rx}").expect_err("Should fail");
        assert!(err.message.contains("expected ':'"));
    }

    #[test]
    fn test_unknown_format_code() {
        let err = parse("{a:q}").expect_err("Should fail");
        assert!(err.message.contains("unknown format code 'q'"));
        assert_eq!(err.span, 3..4);
    }

    #[test]
    fn test_grouping_not_supported() {
        let err = parse("{a:,}").expect_err("Should fail");
        assert!(err.message.contains("grouping"));
    }

    #[test]
    fn test_missing_precision() {
        let err = parse("{a:.f}").expect_err("Should fail");
        assert!(err.message.contains("missing precision"));
    }

    #[test]
    fn test_huge_width_rejected() {
        let err = parse("{x:99999999999999999999}").expect_err("Should fail");
        assert!(err.message.contains("too many decimal digits"));
        assert_eq!(err.span, 3..23);

        let err = parse("{x:1000000000000}").expect_err("Should fail");
        assert!(err.message.contains("too many decimal digits"));
    }

    #[test]
    fn test_huge_precision_rejected() {
        let err = parse("{y:.1000000000000f}").expect_err("Should fail");
        assert!(err.message.contains("too many decimal digits"));
        assert_eq!(err.span, 4..17);
    }

    #[test]
    fn test_width_bound_is_inclusive() {
        let template = parse("{x:65535}").expect("Should parse");
        assert_eq!(only_field(&template).spec.width, Some(MAX_FORMAT_NUMBER));
        assert!(parse("{x:65536}").is_err());
        assert!(parse("{x:.65536}").is_err());
    }
}
