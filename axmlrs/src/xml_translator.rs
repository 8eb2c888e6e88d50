/// A materialised attribute of a start tag. `namespace` is the full URI;
/// the translator maps it back to a declared prefix on output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct NamespaceBinding {
    prefix: String,
    uri: String,
}

/// Consumes parse events and renders the textual document: tab indentation,
/// namespace declarations on their opening element, self-closing tags, and
/// XML escaping.
pub struct XmlTranslator {
    doc: String,
    stack: Vec<NamespaceBinding>,
    pending: Vec<NamespaceBinding>,
    depth: usize,
    tag_open: bool,
}

impl Default for XmlTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlTranslator {
    pub fn new() -> Self {
        Self {
            doc: String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"),
            stack: Vec::new(),
            pending: Vec::new(),
            depth: 0,
            tag_open: false,
        }
    }

    /// A binding becomes visible immediately but is only declared on the
    /// next start tag.
    pub fn start_namespace(&mut self, prefix: Option<&str>, uri: Option<&str>) {
        if let (Some(prefix), Some(uri)) = (prefix, uri) {
            let binding = NamespaceBinding {
                prefix: prefix.to_owned(),
                uri: uri.to_owned(),
            };
            self.stack.push(binding.clone());
            self.pending.push(binding);
        }
    }

    pub fn end_namespace(&mut self, prefix: Option<&str>, uri: Option<&str>) {
        if let (Some(prefix), Some(uri)) = (prefix, uri) {
            if let Some(i) = self
                .stack
                .iter()
                .rposition(|b| b.prefix == prefix && b.uri == uri)
            {
                self.stack.remove(i);
            }
        }
    }

    pub fn start_element(&mut self, namespace: Option<&str>, name: &str, attributes: &[XmlAttribute]) {
        self.close_open_tag();

        let mut tag = String::from("<");
        if let Some(prefix) = namespace.and_then(|uri| self.prefix_for_uri(uri)) {
            tag.push_str(prefix);
            tag.push(':');
        }
        tag.push_str(name);

        for binding in &self.pending {
            tag.push_str(" xmlns:");
            tag.push_str(&binding.prefix);
            tag.push_str("=\"");
            tag.push_str(&escape_xml(&binding.uri));
            tag.push('"');
        }
        self.pending.clear();

        for attr in attributes {
            tag.push(' ');
            if let Some(uri) = attr.namespace.as_deref().filter(|u| !u.is_empty()) {
                // An undeclared namespace keeps its URI as the prefix.
                let prefix = self.prefix_for_uri(uri).unwrap_or(uri);
                tag.push_str(prefix);
                tag.push(':');
            }
            tag.push_str(&attr.name);
            tag.push_str("=\"");
            tag.push_str(&escape_xml(&attr.value));
            tag.push('"');
        }

        self.indent();
        self.doc.push_str(&tag);
        self.depth += 1;
        self.tag_open = true;
    }

    pub fn end_element(&mut self, namespace: Option<&str>, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        if self.tag_open {
            self.doc.push_str(" />\n");
            self.tag_open = false;
            return;
        }

        let prefix = namespace.and_then(|uri| self.prefix_for_uri(uri)).map(str::to_owned);
        self.indent();
        self.doc.push_str("</");
        if let Some(prefix) = prefix {
            self.doc.push_str(&prefix);
            self.doc.push(':');
        }
        self.doc.push_str(name);
        self.doc.push_str(">\n");
    }

    pub fn cdata(&mut self, text: &str) {
        self.close_open_tag();
        self.indent();
        self.doc.push_str(&escape_xml(text));
        self.doc.push('\n');
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn into_document(self) -> String {
        self.doc
    }

    /// The most recently pushed binding for a URI wins.
    fn prefix_for_uri(&self, uri: &str) -> Option<&str> {
        self.stack
            .iter()
            .rev()
            .find(|b| b.uri == uri)
            .map(|b| b.prefix.as_str())
    }

    fn close_open_tag(&mut self) {
        if self.tag_open {
            self.doc.push_str(">\n");
            self.tag_open = false;
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.doc.push('\t');
        }
    }
}

/// Escapes the five markup characters and drops control characters below
/// 0x20 other than tab, newline and carriage return.
fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}
