use std::collections::BTreeMap;

use tracing::debug;

use crate::grammar::Grammar;
use crate::rule::{Rule, RuleKind};
use crate::token::Token;

/// A node of the match tree: the rule that matched, the significant tokens
/// it consumed, and nested matches from recursive, child and alias scans.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRule<'g> {
    pub rule: Option<&'g Rule>,
    pub tokens: Vec<Token>,
    pub matches: Vec<MatchedRule<'g>>,
}

impl<'g> MatchedRule<'g> {
    pub fn new(rule: Option<&'g Rule>, tokens: Vec<Token>) -> Self {
        Self {
            rule,
            tokens,
            matches: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.rule.map(|r| r.name.as_str())
    }

    pub fn kind(&self) -> Option<RuleKind> {
        self.rule.map(|r| r.kind)
    }

    /// Tokens of this match and every descendant, each once, in source order.
    pub fn all_tokens(&self) -> Vec<Token> {
        let mut seen: BTreeMap<(usize, usize), Token> = BTreeMap::new();
        self.collect_tokens(&mut seen);
        seen.into_values().collect()
    }

    fn collect_tokens(&self, seen: &mut BTreeMap<(usize, usize), Token>) {
        for token in &self.tokens {
            seen.entry((token.line, token.start))
                .or_insert_with(|| token.clone());
        }
        for child in &self.matches {
            child.collect_tokens(seen);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ScanMode<'r> {
    /// Top level of a statement: runs to the end of the tokens.
    Statement,
    /// Inside a recursive rule: stops before any of `end`, or after a
    /// closing group token.
    Group { end: &'r [String] },
    /// Tries for a single construct and gives up on the first mismatch.
    First,
}

#[derive(Debug, Default)]
struct Scan<'g> {
    matches: Vec<MatchedRule<'g>>,
    /// Tokens of the input slice used up by the scan.
    consumed: usize,
    /// The closing group token that ended a `Group` scan.
    closer: Option<Token>,
}

/// Matches token runs against a grammar's rule table.
///
/// Unrecognised fragments are dropped: after a mismatch the matcher retries
/// the token once against the full working set and otherwise skips it.
#[derive(Debug)]
pub struct Matcher<'g> {
    grammar: &'g Grammar,
    standalone: Vec<&'g Rule>,
    aliases: Vec<&'g Rule>,
}

impl<'g> Matcher<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            standalone: grammar.standalone_rules().collect(),
            aliases: grammar.alias_rules().collect(),
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Match one statement's tokens into a forest of top-level constructs.
    pub fn match_statement(&self, tokens: &[Token]) -> Vec<MatchedRule<'g>> {
        self.scan(tokens, &self.standalone, ScanMode::Statement).matches
    }

    fn scan(&self, tokens: &[Token], rules: &[&'g Rule], mode: ScanMode<'_>) -> Scan<'g> {
        let first = matches!(mode, ScanMode::First);
        let mut out = Scan::default();
        let mut working: Vec<&'g Rule> = rules.to_vec();
        let mut buffer: Vec<Token> = Vec::new();
        let mut counter = 0;
        let mut recheck = true;
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            if self.grammar.is_ignorable(token) {
                i += 1;
                continue;
            }

            if let ScanMode::Group { end } = mode {
                if token.has_any_scope(end) {
                    out.consumed = i;
                    return out;
                }
                if self.grammar.is_group_end(token) {
                    out.closer = Some(token.clone());
                    out.consumed = i + 1;
                    return out;
                }
            }

            if self.grammar.is_punctuation(token) {
                if first && buffer.is_empty() {
                    return Scan::default();
                }
                buffer.push(token.clone());
                i += 1;
                continue;
            }

            let rest = &tokens[i + 1..];
            let survivors: Vec<&'g Rule> = working
                .iter()
                .copied()
                .filter(|rule| self.accepts(rule, token, counter, rest))
                .collect();

            if survivors.is_empty() {
                if first {
                    return Scan::default();
                }
                if counter > 0 && self.grammar.is_group_begin(token) {
                    let inner = self.scan(rest, &self.standalone, ScanMode::Group { end: &[] });
                    out.matches.extend(inner.matches);
                    i += 1 + inner.consumed;
                } else if recheck && counter > 0 {
                    // Retry the same token from a clean slate; the fragment
                    // before it may have been a dead end.
                    recheck = false;
                } else {
                    recheck = true;
                    debug!(
                        line = token.line,
                        start = token.start,
                        value = %token.value,
                        "no rule matches token, skipping"
                    );
                    i += 1;
                }
                working = rules.to_vec();
                buffer.clear();
                counter = 0;
                continue;
            }

            recheck = true;
            working = survivors;
            counter += 1;
            buffer.push(token.clone());
            i += 1;

            if working.len() == 1 && self.completes(working[0], &buffer) {
                let rule = working[0];
                let mut matched = MatchedRule::new(Some(rule), std::mem::take(&mut buffer));
                i += self.extend(&mut matched, rule, &tokens[i..]);
                out.matches.push(matched);
                if first {
                    out.consumed = i;
                    return out;
                }
                working = rules.to_vec();
                counter = 0;
            }
        }

        if first {
            return Scan::default();
        }
        out.consumed = tokens.len();
        out
    }

    /// Run the follow-up scans a fresh match asks for. Returns how many of
    /// `rest` they consumed.
    fn extend(&self, matched: &mut MatchedRule<'g>, rule: &'g Rule, rest: &[Token]) -> usize {
        let mut used = 0;

        if rule.kind.is_subquery() {
            used = self.balanced_group_len(rest);
            matched.tokens.extend(rest[..used].iter().cloned());
        } else if rule.recursive {
            let inner = self.scan(rest, &self.standalone, ScanMode::Group { end: rule.end_scopes() });
            matched.matches.extend(inner.matches);
            matched.tokens.extend(inner.closer);
            used = inner.consumed;
        }

        if let Some(names) = &rule.children {
            let children: Vec<&'g Rule> = self.grammar.rules_named(names).collect();
            loop {
                let child = self.scan(&rest[used..], &children, ScanMode::First);
                if child.matches.is_empty() {
                    break;
                }
                used += child.consumed;
                matched.matches.extend(child.matches);
            }
        }

        if rule.alias {
            let alias = self.scan(&rest[used..], &self.aliases, ScanMode::First);
            used += alias.consumed;
            matched.matches.extend(alias.matches);
        }

        used
    }

    /// Length of `tokens` up to and including the group end that balances a
    /// group already open before them, or all of them if it never closes.
    fn balanced_group_len(&self, tokens: &[Token]) -> usize {
        let mut depth = 1usize;
        for (i, token) in tokens.iter().enumerate() {
            if self.grammar.is_group_begin(token) {
                depth += 1;
            } else if self.grammar.is_group_end(token) {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
        }
        tokens.len()
    }

    /// Positional scope check plus, when the rule asks for it, lookahead.
    fn accepts(&self, rule: &Rule, token: &Token, counter: usize, rest: &[Token]) -> bool {
        if !rule.expects(counter, token) {
            return false;
        }
        !rule.has_lookahead() || self.lookahead(rule, counter, rest)
    }

    /// Check positions `counter + 1 ..= rule.lookahead` against the next
    /// significant tokens, then test the first token past that window
    /// against the negative lookahead.
    fn lookahead(&self, rule: &Rule, counter: usize, rest: &[Token]) -> bool {
        let mut check = counter + 1;
        let mut seen = counter;
        if check == rule.scopes.len() && rule.negative_lookahead.is_none() {
            return true;
        }

        let significant = rest
            .iter()
            .filter(|t| !self.grammar.is_ignorable(t) && !self.grammar.is_punctuation(t));
        for token in significant {
            if seen < rule.lookahead {
                if !rule.expects(check, token) {
                    return false;
                }
                seen += 1;
                check += 1;
                continue;
            }
            return match &rule.negative_lookahead {
                Some(negative) => !token.has_any_scope(negative),
                None => true,
            };
        }
        true
    }

    /// The buffer's significant tokens line up with every scope of `rule`.
    fn completes(&self, rule: &Rule, buffer: &[Token]) -> bool {
        let significant: Vec<&Token> = buffer
            .iter()
            .filter(|t| !self.grammar.is_punctuation(t))
            .collect();
        significant.len() == rule.scopes.len()
            && significant
                .iter()
                .enumerate()
                .all(|(position, token)| rule.expects(position, token))
    }
}
