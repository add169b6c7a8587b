use std::borrow::Cow;

pub const XML_DECLARATION: &[u8] =
    b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// Typed attribute value. Numbers are formatted with itoa/ryu at write time.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue<'a> {
    Str(Cow<'a, str>),
    Int(i64),
    Num(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attr<'a> {
    pub key: &'static str,
    pub value: AttrValue<'a>,
}

impl<'a> Attr<'a> {
    #[inline]
    pub fn str(key: &'static str, value: impl Into<Cow<'a, str>>) -> Self {
        Self { key, value: AttrValue::Str(value.into()) }
    }

    #[inline]
    pub fn int(key: &'static str, value: impl Into<i64>) -> Self {
        Self { key, value: AttrValue::Int(value.into()) }
    }

    #[inline]
    pub fn num(key: &'static str, value: f64) -> Self {
        Self { key, value: AttrValue::Num(value) }
    }
}

/// Append a float the way Excel expects: integral values without a
/// fractional part, everything else in shortest round-trip form.
#[inline(always)]
pub fn write_f64(buf: &mut Vec<u8>, value: f64) {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        buf.extend_from_slice(itoa::Buffer::new().format(value as i64).as_bytes());
    } else {
        let mut ryu_buf = ryu::Buffer::new();
        buf.extend_from_slice(ryu_buf.format(value).as_bytes());
    }
}

pub fn format_f64(value: f64) -> String {
    let mut buf = Vec::with_capacity(24);
    write_f64(&mut buf, value);
    String::from_utf8_lossy(&buf).into_owned()
}

/// SIMD-accelerated XML escaping of attribute values (& < > ")
#[inline(always)]
pub fn escape_attr_into(input: &[u8], output: &mut Vec<u8>) {
    let needs_escape = memchr::memchr3(b'&', b'<', b'>', input).is_some()
        || memchr::memchr(b'"', input).is_some();

    if !needs_escape {
        output.extend_from_slice(input);
        return;
    }
    escape_slow(input, output, true);
}

/// SIMD-accelerated XML escaping of element text (& < >)
#[inline(always)]
pub fn escape_data_into(input: &[u8], output: &mut Vec<u8>) {
    if memchr::memchr3(b'&', b'<', b'>', input).is_none() {
        output.extend_from_slice(input);
        return;
    }
    escape_slow(input, output, false);
}

fn escape_slow(input: &[u8], output: &mut Vec<u8>, quotes: bool) {
    let mut last = 0;

    for (pos, &byte) in input.iter().enumerate() {
        let escape: &[u8] = match byte {
            b'&' => b"&amp;",
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            b'"' if quotes => b"&quot;",
            _ => continue,
        };
        output.extend_from_slice(&input[last..pos]);
        output.extend_from_slice(escape);
        last = pos + 1;
    }

    if last < input.len() {
        output.extend_from_slice(&input[last..]);
    }
}

#[inline]
fn is_escaped_control(c: char) -> bool {
    matches!(c, '\u{01}'..='\u{08}' | '\u{0B}'..='\u{1F}')
}

/// Replace control characters Excel cannot store literally with `_xHHHH_`.
/// Tab and newline pass through.
pub fn escape_control_characters(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_escaped_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        if is_escaped_control(c) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Minimal streaming XML emitter. Everything that reaches the package goes
/// through one of these.
#[derive(Debug, Default)]
pub struct XmlWriter {
    buf: Vec<u8>,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(4096) }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    #[inline]
    pub fn declaration(&mut self) {
        self.buf.extend_from_slice(XML_DECLARATION);
    }

    #[inline]
    fn write_attrs(&mut self, attrs: &[Attr]) {
        for attr in attrs {
            self.buf.push(b' ');
            self.buf.extend_from_slice(attr.key.as_bytes());
            self.buf.extend_from_slice(b"=\"");
            match &attr.value {
                AttrValue::Str(s) => escape_attr_into(s.as_bytes(), &mut self.buf),
                AttrValue::Int(i) => {
                    self.buf.extend_from_slice(itoa::Buffer::new().format(*i).as_bytes())
                }
                AttrValue::Num(n) => write_f64(&mut self.buf, *n),
            }
            self.buf.push(b'"');
        }
    }

    pub fn start_tag(&mut self, tag: &str, attrs: &[Attr]) {
        self.buf.push(b'<');
        self.buf.extend_from_slice(tag.as_bytes());
        self.write_attrs(attrs);
        self.buf.push(b'>');
    }

    pub fn end_tag(&mut self, tag: &str) {
        self.buf.extend_from_slice(b"</");
        self.buf.extend_from_slice(tag.as_bytes());
        self.buf.push(b'>');
    }

    pub fn empty_tag(&mut self, tag: &str, attrs: &[Attr]) {
        self.buf.push(b'<');
        self.buf.extend_from_slice(tag.as_bytes());
        self.write_attrs(attrs);
        self.buf.extend_from_slice(b"/>");
    }

    /// `<tag attrs>escaped data</tag>`
    pub fn data_element(&mut self, tag: &str, data: &str, attrs: &[Attr]) {
        self.start_tag(tag, attrs);
        escape_data_into(data.as_bytes(), &mut self.buf);
        self.end_tag(tag);
    }

    /// `<tag>number</tag>`
    pub fn num_element(&mut self, tag: &str, value: f64) {
        self.start_tag(tag, &[]);
        write_f64(&mut self.buf, value);
        self.end_tag(tag);
    }

    #[inline]
    pub fn data(&mut self, text: &str) {
        escape_data_into(text.as_bytes(), &mut self.buf);
    }

    /// Pre-formed markup, written verbatim.
    #[inline]
    pub fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(w: XmlWriter) -> String {
        String::from_utf8(w.into_bytes()).unwrap()
    }

    #[test]
    fn test_declaration() {
        let mut w = XmlWriter::new();
        w.declaration();
        assert_eq!(
            text(w),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n"
        );
    }

    #[test]
    fn test_tags_and_attributes() {
        let mut w = XmlWriter::new();
        w.start_tag("foo", &[Attr::str("span", "8"), Attr::int("ht", 15)]);
        w.empty_tag("bar", &[Attr::num("w", 8.43)]);
        w.data_element("baz", "a<b", &[]);
        w.end_tag("foo");
        assert_eq!(
            text(w),
            "<foo span=\"8\" ht=\"15\"><bar w=\"8.43\"/><baz>a&lt;b</baz></foo>"
        );
    }

    #[test]
    fn test_attribute_escaping() {
        let mut w = XmlWriter::new();
        w.empty_tag("foo", &[Attr::str("key", "\"&<>'")]);
        assert_eq!(text(w), "<foo key=\"&quot;&amp;&lt;&gt;'\"/>");
    }

    #[test]
    fn test_data_escaping_leaves_quotes() {
        let mut w = XmlWriter::new();
        w.data_element("t", "say \"hi\" & <bye>", &[]);
        assert_eq!(text(w), "<t>say \"hi\" &amp; &lt;bye&gt;</t>");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_f64(1.0), "1");
        assert_eq!(format_f64(-3.0), "-3");
        assert_eq!(format_f64(0.5), "0.5");
        assert_eq!(format_f64(123.456), "123.456");
        assert_eq!(format_f64(1e20), "1e20");
    }

    #[test]
    fn test_control_character_escaping() {
        assert_eq!(escape_control_characters("abc"), "abc");
        assert_eq!(escape_control_characters("a\u{01}b"), "a_x0001_b");
        assert_eq!(escape_control_characters("tab\tnl\n"), "tab\tnl\n");
        assert_eq!(escape_control_characters("\u{1F}"), "_x001F_");
        assert_eq!(escape_control_characters("\r"), "_x000D_");
    }
}
