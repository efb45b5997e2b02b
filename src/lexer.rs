use compact_str::CompactString;
use memchr::{memchr, memchr2, memmem};
use phf::phf_map;
use smallvec::{smallvec, SmallVec};

use crate::scope;
use crate::token::{GrammarToken, Scopes};
use crate::tokenizer::{ScopeTokenizer, TokenizeLineResult};

/// Lexical mode that can span a line break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
enum LexMode {
    #[default]
    Code,
    BlockComment,
    TripleQuoted(u8),
}

/// Clause the scanner is currently inside. Decides how bare identifiers
/// are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Clause {
    Columns,
    Object,
    Condition,
    List,
    With,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Expect {
    Operand,
    AfterOperand,
    ObjectName,
    AfterObject,
    Tag,
    Type,
    CteName,
    Call,
    Window,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GroupKind {
    Plain,
    Arguments,
    Window,
    Derived,
    Cte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Opener {
    Root,
    Paren(GroupKind),
    Case,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Frame {
    opener: Opener,
    clause: Clause,
    expect: Expect,
}

impl Frame {
    const ROOT: Frame = Frame {
        opener: Opener::Root,
        clause: Clause::Columns,
        expect: Expect::Operand,
    };
}

/// Scanner state carried from the end of one line to the start of the next:
/// the lexical mode plus a stack of open parentheses and CASE blocks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScannerState {
    mode: LexMode,
    frames: SmallVec<[Frame; 4]>,
    after_dot: bool,
}

impl Default for ScannerState {
    fn default() -> Self {
        Self {
            mode: LexMode::Code,
            frames: smallvec![Frame::ROOT],
            after_dot: false,
        }
    }
}

impl ScannerState {
    /// Number of open parentheses and CASE blocks.
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    pub fn in_block_comment(&self) -> bool {
        self.mode == LexMode::BlockComment
    }

    pub fn in_string(&self) -> bool {
        matches!(self.mode, LexMode::TripleQuoted(_))
    }

    fn top(&self) -> Frame {
        self.frames.last().copied().unwrap_or(Frame::ROOT)
    }

    fn top_mut(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::ROOT);
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn enter(&mut self, clause: Clause, expect: Expect) {
        let frame = self.top_mut();
        frame.clause = clause;
        frame.expect = expect;
    }

    fn expect(&mut self, expect: Expect) {
        self.top_mut().expect = expect;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Select,
    Distinct,
    Dml,
    From,
    JoinPrefix,
    Join,
    On,
    Using,
    Where,
    Group,
    Having,
    Order,
    Partition,
    Direction,
    Limit,
    As,
    With,
    Case,
    When,
    Then,
    Else,
    End,
    Over,
    Logical,
    Comparison,
    Not,
    Constant,
    Set,
    Union,
    Other,
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "select" => Keyword::Select,
    "distinct" => Keyword::Distinct,
    "insert" => Keyword::Dml,
    "update" => Keyword::Dml,
    "delete" => Keyword::Dml,
    "merge" => Keyword::Dml,
    "truncate" => Keyword::Dml,
    "call" => Keyword::Dml,
    "create" => Keyword::Dml,
    "drop" => Keyword::Dml,
    "alter" => Keyword::Dml,
    "from" => Keyword::From,
    "join" => Keyword::Join,
    "inner" => Keyword::JoinPrefix,
    "cross" => Keyword::JoinPrefix,
    "left" => Keyword::JoinPrefix,
    "right" => Keyword::JoinPrefix,
    "full" => Keyword::JoinPrefix,
    "natural" => Keyword::JoinPrefix,
    "on" => Keyword::On,
    "using" => Keyword::Using,
    "where" => Keyword::Where,
    "group" => Keyword::Group,
    "having" => Keyword::Having,
    "qualify" => Keyword::Having,
    "order" => Keyword::Order,
    "partition" => Keyword::Partition,
    "asc" => Keyword::Direction,
    "desc" => Keyword::Direction,
    "limit" => Keyword::Limit,
    "as" => Keyword::As,
    "with" => Keyword::With,
    "case" => Keyword::Case,
    "when" => Keyword::When,
    "then" => Keyword::Then,
    "else" => Keyword::Else,
    "end" => Keyword::End,
    "over" => Keyword::Over,
    "and" => Keyword::Logical,
    "or" => Keyword::Logical,
    "in" => Keyword::Comparison,
    "is" => Keyword::Comparison,
    "like" => Keyword::Comparison,
    "between" => Keyword::Comparison,
    "not" => Keyword::Not,
    "null" => Keyword::Constant,
    "true" => Keyword::Constant,
    "false" => Keyword::Constant,
    "set" => Keyword::Set,
    "values" => Keyword::Set,
    "union" => Keyword::Union,
    "intersect" => Keyword::Union,
    "except" => Keyword::Union,
    "by" => Keyword::Other,
    "all" => Keyword::Other,
    "exists" => Keyword::Other,
    "interval" => Keyword::Other,
    "into" => Keyword::Other,
    "table" => Keyword::Other,
    "outer" => Keyword::Other,
    "offset" => Keyword::Other,
    "window" => Keyword::Other,
    "nulls" => Keyword::Other,
};

/// Reference scope tokenizer for BigQuery-flavoured SQL.
///
/// Every byte of a line is covered by exactly one token; whitespace tokens
/// carry only the root scope.
#[derive(Debug, Clone, Default)]
pub struct SqlScanner {
    token_limit: Option<usize>,
}

impl SqlScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after `limit` tokens per call and report an early stop, the way
    /// time-boxed editor tokenizers do.
    pub fn with_token_limit(limit: usize) -> Self {
        Self {
            token_limit: Some(limit.max(1)),
        }
    }
}

impl ScopeTokenizer for SqlScanner {
    type State = ScannerState;

    fn tokenize_line(
        &self,
        text: &str,
        state: Option<&ScannerState>,
    ) -> TokenizeLineResult<ScannerState> {
        let mut state = state.cloned().unwrap_or_default();
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < text.len() {
            if self.token_limit.is_some_and(|limit| tokens.len() >= limit) {
                return TokenizeLineResult {
                    tokens,
                    state,
                    stopped_early: true,
                };
            }
            let (len, scopes) = lex_one(text, pos, &mut state);
            tokens.push(GrammarToken {
                scopes,
                start: pos,
                end: pos + len,
            });
            pos += len;
        }

        TokenizeLineResult {
            tokens,
            state,
            stopped_early: false,
        }
    }
}

fn scopes(names: &[&str]) -> Scopes {
    let mut out = Scopes::new();
    out.push(CompactString::from(scope::ROOT));
    out.extend(names.iter().map(|n| CompactString::from(*n)));
    out
}

/// Lex one token at `pos`. Always returns a non-zero length that ends on a
/// character boundary.
fn lex_one(text: &str, pos: usize, state: &mut ScannerState) -> (usize, Scopes) {
    let rest = &text.as_bytes()[pos..];
    match state.mode {
        LexMode::BlockComment => {
            let len = match memmem::find(rest, b"*/") {
                Some(i) => {
                    state.mode = LexMode::Code;
                    i + 2
                }
                None => rest.len(),
            };
            (len, scopes(&[scope::COMMENT_BLOCK]))
        }
        LexMode::TripleQuoted(quote) => {
            let len = match find_triple(rest, quote, 0) {
                Some(end) => {
                    state.mode = LexMode::Code;
                    state.expect(Expect::AfterOperand);
                    end
                }
                None => rest.len(),
            };
            (len, scopes(&[scope::STRING_TRIPLE]))
        }
        LexMode::Code => lex_code(text, pos, state),
    }
}

fn lex_code(text: &str, pos: usize, state: &mut ScannerState) -> (usize, Scopes) {
    let rest = &text.as_bytes()[pos..];
    let b = rest[0];
    let next = rest.get(1).copied();

    if b.is_ascii_whitespace() {
        return (skip_whitespace(rest), scopes(&[]));
    }
    if b == b'-' && next == Some(b'-') {
        return (rest.len(), scopes(&[scope::COMMENT_LINE]));
    }
    if b == b'#' {
        return (rest.len(), scopes(&[scope::COMMENT_HASH]));
    }
    if b == b'/' && next == Some(b'*') {
        let len = match memmem::find(&rest[2..], b"*/") {
            Some(i) => i + 4,
            None => {
                state.mode = LexMode::BlockComment;
                rest.len()
            }
        };
        return (len, scopes(&[scope::COMMENT_BLOCK]));
    }

    let after_dot = std::mem::take(&mut state.after_dot);
    let top = state.top();

    if is_word_start(b) || (b.is_ascii_digit() && (after_dot || top.expect == Expect::ObjectName))
    {
        return lex_word(text, pos, state, after_dot);
    }

    match b {
        b'\'' | b'"' => {
            if rest.starts_with(&[b, b, b]) {
                let len = match find_triple(rest, b, 3) {
                    Some(end) => {
                        state.expect(Expect::AfterOperand);
                        end
                    }
                    None => {
                        state.mode = LexMode::TripleQuoted(b);
                        rest.len()
                    }
                };
                return (len, scopes(&[scope::STRING_TRIPLE]));
            }
            let len = scan_string(rest);
            state.expect(Expect::AfterOperand);
            let name = if b == b'\'' {
                scope::STRING_SINGLE
            } else {
                scope::STRING_DOUBLE
            };
            (len, scopes(&[name]))
        }
        b'`' => {
            let len = memchr(b'`', &rest[1..]).map_or(rest.len(), |i| i + 2);
            let name = classify_identifier(state, &rest[len..], after_dot);
            (len, scopes(&[name]))
        }
        b'0'..=b'9' => {
            let len = scan_number(rest).max(1);
            state.expect(Expect::AfterOperand);
            (len, scopes(&[scope::CONSTANT_NUMERIC]))
        }
        b'.' if !after_dot && next.is_some_and(|c| c.is_ascii_digit()) => {
            let len = scan_number(rest).max(1);
            state.expect(Expect::AfterOperand);
            (len, scopes(&[scope::CONSTANT_NUMERIC]))
        }
        b'.' => {
            state.after_dot = true;
            (1, scopes(&[scope::PERIOD]))
        }
        b',' => {
            let frame = state.top_mut();
            frame.expect = match frame.clause {
                Clause::Object => Expect::ObjectName,
                Clause::With => Expect::CteName,
                _ => Expect::Operand,
            };
            (1, scopes(&[scope::COMMA]))
        }
        b';' => {
            *state = ScannerState::default();
            (1, scopes(&[scope::TERMINATOR]))
        }
        b'(' => {
            open_group(state);
            (1, scopes(&[scope::GROUP_BEGIN]))
        }
        b')' => {
            close_group(state);
            (1, scopes(&[scope::GROUP_END]))
        }
        b'[' | b']' => (1, scopes(&[scope::BRACKET])),
        b'@' | b'?' => {
            let mut len = 1;
            if b == b'@' {
                if next == Some(b'@') {
                    len += 1;
                }
                len += scan_word(&rest[len..]);
            }
            state.expect(Expect::AfterOperand);
            (len, scopes(&[scope::PARAMETER]))
        }
        b'*' if after_dot || top.expect != Expect::AfterOperand => {
            state.expect(Expect::AfterOperand);
            (1, scopes(&[scope::COLUMN, scope::STAR]))
        }
        _ => match scan_operator(rest) {
            Some((len, name)) => {
                state.expect(Expect::Operand);
                (len, scopes(&[name]))
            }
            None => {
                let len = text[pos..].chars().next().map_or(1, char::len_utf8);
                (len, scopes(&[scope::INVALID]))
            }
        },
    }
}

fn lex_word(text: &str, pos: usize, state: &mut ScannerState, after_dot: bool) -> (usize, Scopes) {
    let rest = &text.as_bytes()[pos..];
    let len = if state.top().expect == Expect::ObjectName {
        scan_object_word(rest)
    } else {
        scan_word(rest)
    };

    if !after_dot {
        let lower = text[pos..pos + len].to_ascii_lowercase();
        if let Some(&keyword) = KEYWORDS.get(lower.as_str()) {
            let extra = try_multi_word(&lower, &rest[len..]);
            if let Some(name) = apply_keyword(state, keyword, extra.is_some()) {
                return (len + extra.unwrap_or(0), scopes(&[name]));
            }
        }
    }

    let name = classify_identifier(state, &rest[len..], after_dot);
    (len, scopes(&[name]))
}

/// Update the clause stack for a keyword and return its scope. `None`
/// means the word is not acting as a keyword here (`LEFT(` is a function).
fn apply_keyword(state: &mut ScannerState, keyword: Keyword, extended: bool) -> Option<&'static str> {
    let name = match keyword {
        Keyword::Select => {
            state.enter(Clause::Columns, Expect::Operand);
            scope::KEYWORD_SELECT
        }
        Keyword::Distinct => scope::KEYWORD_DISTINCT,
        Keyword::Dml => {
            state.enter(Clause::Object, Expect::ObjectName);
            scope::KEYWORD_DML
        }
        Keyword::From => {
            state.enter(Clause::Object, Expect::ObjectName);
            scope::KEYWORD_FROM
        }
        Keyword::Join => {
            state.enter(Clause::Object, Expect::ObjectName);
            scope::KEYWORD_JOIN
        }
        Keyword::JoinPrefix => {
            if !extended {
                return None;
            }
            state.enter(Clause::Object, Expect::ObjectName);
            scope::KEYWORD_JOIN
        }
        Keyword::On => {
            state.enter(Clause::Condition, Expect::Operand);
            scope::KEYWORD_ON
        }
        Keyword::Using => {
            state.enter(Clause::Condition, Expect::Operand);
            scope::KEYWORD_USING
        }
        Keyword::Where => {
            state.enter(Clause::Condition, Expect::Operand);
            scope::KEYWORD_WHERE
        }
        Keyword::Having => {
            state.enter(Clause::Condition, Expect::Operand);
            scope::KEYWORD_HAVING
        }
        Keyword::Group => {
            state.enter(Clause::List, Expect::Operand);
            scope::KEYWORD_GROUP
        }
        Keyword::Order => {
            state.enter(Clause::List, Expect::Operand);
            scope::KEYWORD_ORDER
        }
        Keyword::Partition => {
            state.enter(Clause::List, Expect::Operand);
            scope::KEYWORD_PARTITION
        }
        Keyword::Direction => {
            state.expect(Expect::AfterOperand);
            scope::KEYWORD_DIRECTION
        }
        Keyword::Limit => {
            state.enter(Clause::Condition, Expect::Operand);
            scope::KEYWORD_LIMIT
        }
        Keyword::As => {
            let frame = state.top_mut();
            frame.expect = match (frame.opener, frame.clause) {
                (Opener::Paren(GroupKind::Arguments), _) => Expect::Type,
                (_, Clause::Object) => Expect::AfterObject,
                (_, Clause::With) => Expect::Done,
                _ => Expect::Tag,
            };
            scope::KEYWORD_AS
        }
        Keyword::With => {
            state.enter(Clause::With, Expect::CteName);
            scope::KEYWORD_WITH
        }
        Keyword::Case => {
            state.frames.push(Frame {
                opener: Opener::Case,
                clause: Clause::Condition,
                expect: Expect::Operand,
            });
            scope::KEYWORD_CASE
        }
        Keyword::When => {
            state.enter(Clause::Condition, Expect::Operand);
            scope::KEYWORD_WHEN
        }
        Keyword::Then => {
            state.enter(Clause::Condition, Expect::Operand);
            scope::KEYWORD_THEN
        }
        Keyword::Else => {
            state.enter(Clause::Condition, Expect::Operand);
            scope::KEYWORD_ELSE
        }
        Keyword::End => {
            if state.top().opener == Opener::Case {
                state.frames.pop();
                state.expect(Expect::AfterOperand);
            }
            scope::KEYWORD_END
        }
        Keyword::Over => {
            state.expect(Expect::Window);
            scope::KEYWORD_OVER
        }
        Keyword::Logical => {
            state.expect(Expect::Operand);
            scope::OPERATOR_LOGICAL
        }
        Keyword::Comparison => {
            state.expect(Expect::Operand);
            scope::OPERATOR_COMPARISON
        }
        Keyword::Not => {
            state.expect(Expect::Operand);
            if extended {
                scope::OPERATOR_COMPARISON
            } else {
                scope::OPERATOR_NEGATION
            }
        }
        Keyword::Constant => {
            state.expect(Expect::AfterOperand);
            scope::CONSTANT_LANGUAGE
        }
        Keyword::Set => {
            state.enter(Clause::Condition, Expect::Operand);
            scope::KEYWORD_OTHER
        }
        Keyword::Union => {
            state.enter(Clause::Columns, Expect::Operand);
            scope::KEYWORD_UNION
        }
        Keyword::Other => {
            state.expect(Expect::Operand);
            scope::KEYWORD_OTHER
        }
    };
    Some(name)
}

/// Classify a non-keyword identifier by clause context. `after` is the rest
/// of the line following the identifier.
fn classify_identifier(state: &mut ScannerState, after: &[u8], after_dot: bool) -> &'static str {
    let next = after.get(skip_whitespace(after)).copied();
    let frame = state.top_mut();

    if frame.expect == Expect::ObjectName {
        let parts = count_dotted_parts(after);
        if parts == 0 {
            frame.expect = Expect::AfterObject;
        }
        return match parts {
            0 => scope::OBJECT,
            1 => scope::DATASET,
            _ => scope::PROJECT,
        };
    }

    if !after_dot {
        match frame.expect {
            Expect::AfterObject if frame.clause == Clause::Object => {
                frame.expect = Expect::Done;
                return scope::ALIAS;
            }
            Expect::Tag => {
                frame.expect = Expect::Done;
                return scope::TAG;
            }
            Expect::Type => {
                frame.expect = Expect::AfterOperand;
                return scope::TYPE;
            }
            Expect::CteName => {
                frame.expect = Expect::Done;
                return scope::CTE;
            }
            _ => {}
        }
    }

    if next == Some(b'(') {
        frame.expect = Expect::Call;
        scope::FUNCTION
    } else if next == Some(b'.') {
        frame.expect = Expect::Operand;
        scope::ALIAS
    } else if !after_dot && frame.clause == Clause::Columns && frame.expect == Expect::AfterOperand
    {
        frame.expect = Expect::Done;
        scope::TAG
    } else {
        frame.expect = Expect::AfterOperand;
        scope::COLUMN
    }
}

fn open_group(state: &mut ScannerState) {
    let top = state.top();
    let kind = match top.expect {
        Expect::Call => GroupKind::Arguments,
        Expect::Window => GroupKind::Window,
        _ if top.clause == Clause::Object => GroupKind::Derived,
        _ if top.clause == Clause::With => GroupKind::Cte,
        _ => GroupKind::Plain,
    };
    let clause = match kind {
        GroupKind::Plain | GroupKind::Arguments => Clause::Condition,
        GroupKind::Window => Clause::List,
        GroupKind::Derived | GroupKind::Cte => Clause::Columns,
    };
    state.frames.push(Frame {
        opener: Opener::Paren(kind),
        clause,
        expect: Expect::Operand,
    });
}

/// Close the innermost parenthesis, discarding any CASE left open inside it.
fn close_group(state: &mut ScannerState) {
    let Some(index) = state
        .frames
        .iter()
        .rposition(|f| matches!(f.opener, Opener::Paren(_)))
    else {
        return;
    };
    let kind = match state.frames[index].opener {
        Opener::Paren(kind) => kind,
        _ => GroupKind::Plain,
    };
    state.frames.truncate(index);
    let frame = state.top_mut();
    frame.expect = match kind {
        GroupKind::Derived if frame.clause == Clause::Object => Expect::AfterObject,
        GroupKind::Cte => Expect::Done,
        _ => Expect::AfterOperand,
    };
}

#[inline]
fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn skip_whitespace(bytes: &[u8]) -> usize {
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Identifier characters: alphanumeric, underscore, and any non-ASCII byte
/// (so multi-byte characters are never split).
#[inline]
fn scan_word(bytes: &[u8]) -> usize {
    let mut i = 0;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] >= 0x80)
    {
        i += 1;
    }
    i
}

/// Like [`scan_word`], but also accepts inner hyphens (`my-project`).
fn scan_object_word(bytes: &[u8]) -> usize {
    let mut i = scan_word(bytes);
    while i + 1 < bytes.len() && bytes[i] == b'-' && bytes[i + 1].is_ascii_alphanumeric() {
        i += 1;
        i += scan_word(&bytes[i..]);
    }
    i
}

/// Number of `.part` segments directly following an identifier.
fn count_dotted_parts(bytes: &[u8]) -> usize {
    let mut i = 0;
    let mut parts = 0;
    while i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let len = if bytes.get(i) == Some(&b'`') {
            memchr(b'`', &bytes[i + 1..]).map_or(bytes.len() - i, |j| j + 2)
        } else {
            scan_object_word(&bytes[i..])
        };
        if len == 0 {
            break;
        }
        parts += 1;
        i += len;
    }
    parts
}

/// Decimal, exponent and hex literals. Returns byte length.
fn scan_number(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let mut i = 0;

    if len > 1 && bytes[0] == b'0' && (bytes[1] == b'x' || bytes[1] == b'X') {
        i = 2;
        while i < len && bytes[i].is_ascii_hexdigit() {
            i += 1;
        }
        return i;
    }

    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < len && bytes[i] == b'.' {
        i += 1;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < len && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < len && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < len && bytes[j].is_ascii_digit() {
            i = j;
            while i < len && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}

/// Single- or double-quoted string with backslash escapes. An unterminated
/// string runs to the end of the line.
fn scan_string(bytes: &[u8]) -> usize {
    let quote = bytes[0];
    let mut i = 1;
    while i < bytes.len() {
        match memchr2(quote, b'\\', &bytes[i..]) {
            Some(offset) => {
                let pos = i + offset;
                if bytes[pos] == b'\\' {
                    i = (pos + 2).min(bytes.len());
                    continue;
                }
                return pos + 1;
            }
            None => return bytes.len(),
        }
    }
    bytes.len()
}

/// End offset (exclusive) of the first run of three `quote` bytes at or
/// after `from`.
fn find_triple(bytes: &[u8], quote: u8, from: usize) -> Option<usize> {
    let mut i = from;
    while i + 2 < bytes.len() {
        if bytes[i] == quote && bytes[i + 1] == quote && bytes[i + 2] == quote {
            return Some(i + 3);
        }
        i += 1;
    }
    None
}

const OPERATORS: &[(&[u8], &str)] = &[
    (b"<=", scope::OPERATOR_COMPARISON),
    (b">=", scope::OPERATOR_COMPARISON),
    (b"<>", scope::OPERATOR_COMPARISON),
    (b"!=", scope::OPERATOR_COMPARISON),
    (b"==", scope::OPERATOR_COMPARISON),
    (b"||", scope::OPERATOR_ARITHMETIC),
    (b"=>", scope::OPERATOR_ARITHMETIC),
    (b"->", scope::OPERATOR_ARITHMETIC),
    (b"::", scope::OPERATOR_ARITHMETIC),
    (b"<<", scope::OPERATOR_ARITHMETIC),
    (b">>", scope::OPERATOR_ARITHMETIC),
    (b"=", scope::OPERATOR_COMPARISON),
    (b"<", scope::OPERATOR_COMPARISON),
    (b">", scope::OPERATOR_COMPARISON),
    (b"+", scope::OPERATOR_ARITHMETIC),
    (b"-", scope::OPERATOR_ARITHMETIC),
    (b"*", scope::OPERATOR_ARITHMETIC),
    (b"/", scope::OPERATOR_ARITHMETIC),
    (b"%", scope::OPERATOR_ARITHMETIC),
    (b"&", scope::OPERATOR_ARITHMETIC),
    (b"|", scope::OPERATOR_ARITHMETIC),
    (b"^", scope::OPERATOR_ARITHMETIC),
    (b"~", scope::OPERATOR_ARITHMETIC),
    (b":", scope::OPERATOR_ARITHMETIC),
];

fn scan_operator(bytes: &[u8]) -> Option<(usize, &'static str)> {
    OPERATORS
        .iter()
        .find(|(op, _)| bytes.starts_with(op))
        .map(|(op, name)| (op.len(), *name))
}

const OBJECT_KINDS: &[&[&str]] = &[
    &["materialized", "view"],
    &["external", "table"],
    &["table", "function"],
    &["table"],
    &["view"],
    &["function"],
    &["procedure"],
    &["schema"],
];

const CREATE_MODIFIERS: &[&[&[&str]]] = &[
    &[&["or", "replace"]],
    &[&["temporary"], &["temp"]],
    OBJECT_KINDS,
    &[&["if", "not", "exists"]],
];

const DROP_MODIFIERS: &[&[&[&str]]] = &[OBJECT_KINDS, &[&["if", "exists"]]];

/// Extra bytes consumed by a multi-word keyword starting with `first_lower`.
/// Only words on the same line are joined.
fn try_multi_word(first_lower: &str, after_word: &[u8]) -> Option<usize> {
    match first_lower {
        "left" | "right" | "full" => try_sequence_any(after_word, &[&["outer", "join"], &["join"]]),
        "inner" | "cross" => try_sequence(after_word, &["join"]),
        "natural" => try_sequence_any(
            after_word,
            &[
                &["left", "outer", "join"],
                &["left", "join"],
                &["right", "outer", "join"],
                &["right", "join"],
                &["full", "outer", "join"],
                &["full", "join"],
                &["inner", "join"],
                &["join"],
            ],
        ),
        "group" | "order" | "partition" => try_sequence(after_word, &["by"]),
        "insert" | "merge" => try_sequence(after_word, &["into"]),
        "delete" => try_sequence(after_word, &["from"]),
        "truncate" => try_sequence(after_word, &["table"]),
        "is" => try_sequence(after_word, &["not"]),
        "not" => try_sequence_any(after_word, &[&["in"], &["like"], &["between"]]),
        "union" | "intersect" | "except" => {
            try_sequence_any(after_word, &[&["all"], &["distinct"]])
        }
        "create" => Some(extend_optional(after_word, CREATE_MODIFIERS)).filter(|&n| n > 0),
        "drop" | "alter" => Some(extend_optional(after_word, DROP_MODIFIERS)).filter(|&n| n > 0),
        _ => None,
    }
}

/// Match a word sequence, case-insensitively, with whitespace between
/// words. Returns bytes consumed including leading whitespace.
fn try_sequence(bytes: &[u8], words: &[&str]) -> Option<usize> {
    let mut pos = 0;
    for &word in words {
        let gap = skip_whitespace(&bytes[pos..]);
        if gap == 0 {
            return None;
        }
        pos += gap;
        let word_bytes = word.as_bytes();
        if pos + word_bytes.len() > bytes.len()
            || !bytes[pos..pos + word_bytes.len()].eq_ignore_ascii_case(word_bytes)
        {
            return None;
        }
        pos += word_bytes.len();
        if pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
            return None;
        }
    }
    Some(pos)
}

fn try_sequence_any(bytes: &[u8], sequences: &[&[&str]]) -> Option<usize> {
    sequences.iter().find_map(|seq| try_sequence(bytes, seq))
}

/// Apply each group of optional sequences in order, taking the first match
/// of each group.
fn extend_optional(bytes: &[u8], groups: &[&[&[&str]]]) -> usize {
    let mut pos = 0;
    for group in groups {
        if let Some(extra) = try_sequence_any(&bytes[pos..], group) {
            pos += extra;
        }
    }
    pos
}
