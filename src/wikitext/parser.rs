// ─────────────────────────────────────────────────────────────────────────────
// Wikitext Recursive Descent Parser
// ─────────────────────────────────────────────────────────────────────────────

/// Parsed wikilink: [[target#anchor|display]]. The anchor is skipped.
#[derive(Debug)]
pub struct Wikilink {
    pub target: String,
    pub display: Option<String>,
}

impl Wikilink {
    /// Return display text if present, otherwise the target without any
    /// leading interwiki prefix (`:eo:hundo` -> `hundo`).
    pub fn text(&self) -> &str {
        match self.display.as_deref() {
            Some(display) => display,
            None => {
                let target = self.target.trim_start_matches(':');
                target.rsplit(':').next().unwrap_or(target)
            }
        }
    }
}

/// Parsed template: {{name|param1|param2|...}}
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    pub name: String,
    pub params: Vec<String>,
}

impl ParsedTemplate {
    /// Parameters without a `key=` prefix, in order.
    pub fn positional(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| !is_named_param(p))
            .map(|p| p.as_str())
            .collect()
    }
}

fn is_named_param(param: &str) -> bool {
    match param.split_once('=') {
        Some((key, _)) => {
            let key = key.trim();
            !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        }
        None => false,
    }
}

/// Recursive descent over templates and wikilinks. Nesting depth lives
/// on the call stack; unclosed markup runs to the end of the text.
pub struct WikitextParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> WikitextParser<'a> {
    pub fn new(text: &'a str) -> Self {
        WikitextParser { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at(&self, token: &str) -> bool {
        self.rest().starts_with(token)
    }

    /// Skip `token` if the text continues with it.
    fn eat(&mut self, token: &str) -> bool {
        if self.at(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn done(&self) -> bool {
        self.pos >= self.text.len()
    }

    // ─────────────────────────────────────────────────────────────
    // Whole-text scans
    // ─────────────────────────────────────────────────────────────

    /// Every top-level template of the text, in order. Nested templates are
    /// consumed as part of their parent.
    pub fn templates(mut self) -> Vec<ParsedTemplate> {
        let mut templates = Vec::new();
        while !self.done() {
            if self.at("{{") {
                templates.push(self.template());
            } else {
                self.next_char();
            }
        }
        templates
    }

    /// The text with every template removed and everything else verbatim.
    pub fn without_templates(mut self) -> String {
        let mut out = String::with_capacity(self.text.len());
        while !self.done() {
            if self.at("{{") {
                self.template();
            } else if let Some(c) = self.next_char() {
                out.push(c);
            }
        }
        out
    }

    /// The text with every wikilink replaced by its display text.
    pub fn with_links_resolved(mut self) -> String {
        let mut out = String::with_capacity(self.text.len());
        while !self.done() {
            if self.at("[[") {
                out.push_str(self.wikilink().text());
            } else if let Some(c) = self.next_char() {
                out.push(c);
            }
        }
        out
    }

    // ─────────────────────────────────────────────────────────────
    // template ::= "{{" arg ("|" arg)* "}}"
    // ─────────────────────────────────────────────────────────────
    fn template(&mut self) -> ParsedTemplate {
        self.eat("{{");
        let mut args = Vec::new();
        while !self.done() && !self.at("}}") {
            args.push(self.argument());
            if !self.eat("|") {
                break;
            }
        }
        self.eat("}}");

        let mut args = args.into_iter();
        ParsedTemplate {
            name: args.next().unwrap_or_default(),
            params: args.collect(),
        }
    }

    /// One template argument. Links contribute their display text, nested
    /// templates nothing.
    fn argument(&mut self) -> String {
        let mut out = String::new();
        while !self.done() && !self.at("|") && !self.at("}}") {
            if self.at("[[") {
                out.push_str(self.wikilink().text());
            } else if self.at("{{") {
                self.template();
            } else if let Some(c) = self.next_char() {
                out.push(c);
            }
        }
        out.trim().to_string()
    }

    // ─────────────────────────────────────────────────────────────
    // wikilink ::= "[[" target ("#" anchor)? ("|" display)? "]]"
    // ─────────────────────────────────────────────────────────────
    fn wikilink(&mut self) -> Wikilink {
        self.eat("[[");
        let target = self.until(&['#', '|', ']']);
        if self.eat("#") {
            self.until(&['|', ']']);
        }
        let display = self.eat("|").then(|| self.until(&[']']));
        self.eat("]]");
        Wikilink { target, display }
    }

    fn until(&mut self, stops: &[char]) -> String {
        let rest = self.rest();
        let len = rest.find(stops).unwrap_or(rest.len());
        self.pos += len;
        rest[..len].to_string()
    }
}
