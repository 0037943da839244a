//! Recursive-descent parser for both grammars.

use std::str::FromStr;

use battle_core::{Coord, DamageKind, Direction, DistanceMetric, TargetingMode, Value};

use crate::dsl::ast::*;
use crate::dsl::error::{ParseError, ParseErrorKind, ParseResult, Pos};
use crate::dsl::lexer::{Token, TokenKind, tokenize};

const META_WORDS: [&str; 7] = [
    "range",
    "min_range",
    "cooldown",
    "targeting",
    "distance",
    "sealed_until",
    "ends_turn",
];

const REF_WORDS: [&str; 5] = ["self", "caster", "target", "it", "unit"];

/// Deepest nesting of blocks, parentheses, `not` and unary minus accepted
/// before parsing gives up.
pub const MAX_NESTING: usize = 64;

/// Parses a standalone skill script.
pub fn parse_script(src: &str) -> ParseResult<Script> {
    let mut parser = Parser::new(src)?;
    let script = parser.script_until(&TokenKind::Eof)?;
    parser.expect(TokenKind::Eof, "end of input")?;
    Ok(script)
}

/// Parses a role definition.
pub fn parse_role(src: &str) -> ParseResult<RoleAst> {
    let mut parser = Parser::new(src)?;
    let role = parser.role()?;
    parser.skip_semis();
    parser.expect(TokenKind::Eof, "end of input")?;
    Ok(role)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn new(src: &str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(src)?,
            cursor: 0,
            depth: 0,
        })
    }

    /// Runs `f` one nesting level deeper, failing at the current token once
    /// [`MAX_NESTING`] is exceeded.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(
                ParseErrorKind::TooDeep,
                format!("nesting deeper than {MAX_NESTING} levels"),
                self.pos(),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Counts one more operator in a left-associative chain; each one
    /// deepens the resulting tree by a level.
    fn chain_link(&self, links: &mut usize) -> ParseResult<()> {
        *links += 1;
        if *links > MAX_NESTING {
            return Err(ParseError::new(
                ParseErrorKind::TooDeep,
                format!("more than {MAX_NESTING} chained operators"),
                self.pos(),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.cursor + offset).min(last)]
    }

    fn pos(&self) -> Pos {
        self.peek().pos
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    fn word_at(&self, offset: usize) -> Option<&str> {
        match &self.peek_at(offset).kind {
            TokenKind::Ident(word) => Some(word.as_str()),
            _ => None,
        }
    }

    fn at_word(&self, word: &str) -> bool {
        self.word_at(0) == Some(word)
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, word: &str) -> ParseResult<Pos> {
        if self.at_word(word) {
            Ok(self.advance().pos)
        } else {
            Err(self.unexpected(&format!("`{word}`")))
        }
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> ParseResult<Pos> {
        if self.at(&kind) {
            Ok(self.advance().pos)
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        let kind = if token.kind == TokenKind::Eof {
            ParseErrorKind::UnexpectedEof
        } else {
            ParseErrorKind::UnexpectedToken
        };
        ParseError::new(
            kind,
            format!("expected {expected}, found {}", token.kind),
            token.pos,
        )
    }

    fn skip_semis(&mut self) {
        while self.eat(&TokenKind::Semi) {}
    }

    fn string(&mut self, what: &str) -> ParseResult<String> {
        match &self.peek().kind {
            TokenKind::Str(text) => {
                let text = text.clone();
                self.advance();
                Ok(text)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn ident(&mut self, what: &str) -> ParseResult<Spanned<String>> {
        match &self.peek().kind {
            TokenKind::Ident(word) => {
                let word = word.clone();
                let pos = self.advance().pos;
                Ok(Spanned::new(word, pos))
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Variable name after a `.`: a bare word or a quoted string.
    fn var_name(&mut self) -> ParseResult<String> {
        match &self.peek().kind {
            TokenKind::Ident(word) | TokenKind::Str(word) => {
                let word = word.clone();
                self.advance();
                Ok(word)
            }
            _ => Err(self.unexpected("a variable name")),
        }
    }

    fn int_literal(&mut self, what: &str) -> ParseResult<i64> {
        let negative = self.eat(&TokenKind::Minus);
        match self.peek().kind {
            TokenKind::Int(n) => {
                self.advance();
                Ok(if negative { -n } else { n })
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn parse_word<T: FromStr>(&mut self, what: &str) -> ParseResult<T> {
        let word = self.ident(what)?;
        word.node.parse().map_err(|_| {
            ParseError::new(
                ParseErrorKind::InvalidValue,
                format!("`{}` is not a valid {what}", word.node),
                word.pos,
            )
        })
    }

    // ------------------------------------------------------------------
    // Role grammar
    // ------------------------------------------------------------------

    fn role(&mut self) -> ParseResult<RoleAst> {
        self.expect_word("role")?;
        let name = self.string("a role name")?;
        self.expect_word("id")?;
        let id = self.string("a role id")?;
        self.expect(TokenKind::LBrace, "`{`")?;

        let mut role = RoleAst {
            name,
            id,
            description: String::new(),
            vars: Vec::new(),
            tags: Vec::new(),
            skills: Vec::new(),
        };
        let mut seen: Vec<String> = Vec::new();

        loop {
            self.skip_semis();
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            let section = self.ident("a role section")?;
            if seen.contains(&section.node) {
                return Err(ParseError::new(
                    ParseErrorKind::DuplicateSection,
                    format!("duplicate `{}` section", section.node),
                    section.pos,
                ));
            }
            match section.node.as_str() {
                "description" => role.description = self.string("a description string")?,
                "vars" => role.vars = self.role_vars()?,
                "tags" => role.tags = self.role_tags()?,
                "skills" => role.skills = self.role_skills()?,
                other => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnknownKeyword,
                        format!("unknown role section `{other}`"),
                        section.pos,
                    ));
                }
            }
            seen.push(section.node);
        }
        Ok(role)
    }

    fn role_vars(&mut self) -> ParseResult<Vec<(String, Value)>> {
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut vars = Vec::new();
        loop {
            while self.eat(&TokenKind::Semi) || self.eat(&TokenKind::Comma) {}
            if self.eat(&TokenKind::RBrace) {
                return Ok(vars);
            }
            let key = self.var_name()?;
            self.expect(TokenKind::Assign, "`=`")?;
            let value = self.literal()?;
            vars.push((key, value));
        }
    }

    fn role_tags(&mut self) -> ParseResult<Vec<String>> {
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut tags = Vec::new();
        loop {
            while self.eat(&TokenKind::Semi) || self.eat(&TokenKind::Comma) {}
            if self.eat(&TokenKind::RBrace) {
                return Ok(tags);
            }
            tags.push(self.string("a tag string")?);
        }
    }

    fn role_skills(&mut self) -> ParseResult<Vec<SkillAst>> {
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut skills: Vec<SkillAst> = Vec::new();
        loop {
            self.skip_semis();
            if self.eat(&TokenKind::RBrace) {
                return Ok(skills);
            }
            self.expect_word("skill")?;
            let pos = self.pos();
            let name = self.string("a skill name")?;
            if skills.iter().any(|s| s.name.node == name) {
                return Err(ParseError::new(
                    ParseErrorKind::DuplicateSection,
                    format!("duplicate skill `{name}`"),
                    pos,
                ));
            }
            self.expect(TokenKind::LBrace, "`{`")?;
            let script = self.script_until(&TokenKind::RBrace)?;
            self.expect(TokenKind::RBrace, "`}`")?;
            skills.push(SkillAst {
                name: Spanned::new(name, pos),
                script,
            });
        }
    }

    fn literal(&mut self) -> ParseResult<Value> {
        let pos = self.pos();
        let negative = self.eat(&TokenKind::Minus);
        let token = self.advance();
        let value = match token.kind {
            TokenKind::Int(n) => Value::Int(if negative { -n } else { n }),
            TokenKind::Float(f) => Value::Float(if negative { -f } else { f }),
            TokenKind::Str(text) if !negative => Value::Str(text),
            TokenKind::Ident(word) if !negative && word == "true" => Value::Bool(true),
            TokenKind::Ident(word) if !negative && word == "false" => Value::Bool(false),
            TokenKind::LParen if !negative => {
                let x = self.int_literal("an x coordinate")?;
                self.expect(TokenKind::Comma, "`,`")?;
                let y = self.int_literal("a y coordinate")?;
                self.expect(TokenKind::RParen, "`)`")?;
                let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidValue,
                        "coordinate out of range",
                        pos,
                    ));
                };
                Value::Coord(Coord::new(x, y))
            }
            TokenKind::Eof => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedEof,
                    "expected a literal value, found end of input",
                    token.pos,
                ));
            }
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    format!("expected a literal value, found {other}"),
                    token.pos,
                ));
            }
        };
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Script grammar
    // ------------------------------------------------------------------

    fn script_until(&mut self, end: &TokenKind) -> ParseResult<Script> {
        let mut script = Script::default();
        loop {
            self.skip_semis();
            if self.at(end) || self.at(&TokenKind::Eof) {
                return Ok(script);
            }
            if self.word_at(0).is_some_and(|w| META_WORDS.contains(&w)) {
                let pos = self.pos();
                script.meta.push(Spanned::new(self.meta()?, pos));
            } else {
                script.body.push(self.stmt()?);
            }
        }
    }

    fn meta(&mut self) -> ParseResult<Meta> {
        let word = self.ident("a metadata keyword")?;
        let meta = match word.node.as_str() {
            "range" => Meta::Range(self.int_literal("a range")?),
            "min_range" => Meta::MinRange(self.int_literal("a minimum range")?),
            "cooldown" => Meta::Cooldown(self.int_literal("a cooldown")?),
            "sealed_until" => Meta::SealedUntil(self.int_literal("a turn number")?),
            "targeting" => Meta::Targeting(self.parse_word::<TargetingMode>("targeting mode")?),
            "distance" => Meta::Distance(self.parse_word::<DistanceMetric>("distance metric")?),
            _ => Meta::EndsTurn,
        };
        let negative = match meta {
            Meta::Range(n) | Meta::MinRange(n) | Meta::Cooldown(n) | Meta::SealedUntil(n) => n < 0,
            _ => false,
        };
        if negative {
            return Err(ParseError::new(
                ParseErrorKind::InvalidValue,
                format!("`{}` must not be negative", word.node),
                word.pos,
            ));
        }
        Ok(meta)
    }

    fn stmt(&mut self) -> ParseResult<Spanned<Stmt>> {
        let pos = self.pos();
        let word = match self.word_at(0) {
            Some(word) => word.to_string(),
            None => return Err(self.unexpected("a statement")),
        };
        if META_WORDS.contains(&word.as_str()) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidValue,
                format!("`{word}` is only allowed at the top level of a skill"),
                pos,
            ));
        }
        let stmt = match word.as_str() {
            "deal" => {
                self.advance();
                let kind = self.damage_kind();
                let amount = self.expr()?;
                self.expect_word("damage")?;
                self.expect_word("to")?;
                let target = self.reference()?;
                Stmt::Deal {
                    kind,
                    amount,
                    target,
                }
            }
            "heal" => {
                self.advance();
                let amount = self.expr()?;
                self.expect_word("to")?;
                Stmt::Heal {
                    amount,
                    target: self.reference()?,
                }
            }
            "move" => {
                self.advance();
                let unit = self.reference()?;
                self.expect_word("to")?;
                let to = if self.eat(&TokenKind::LParen) {
                    let x = self.expr()?;
                    self.expect(TokenKind::Comma, "`,`")?;
                    let y = self.expr()?;
                    self.expect(TokenKind::RParen, "`)`")?;
                    Destination::Coord(x, y)
                } else {
                    Destination::At(self.reference()?)
                };
                Stmt::Move { unit, to }
            }
            "dash" => {
                self.advance();
                self.expect_word("towards")?;
                let target = self.reference()?;
                self.expect_word("up")?;
                self.expect_word("to")?;
                Stmt::Dash {
                    target,
                    steps: self.expr()?,
                }
            }
            "line" => {
                self.advance();
                let kind = self.damage_kind();
                let amount = self.expr()?;
                self.expect_word("to")?;
                let target = self.reference()?;
                self.expect_word("length")?;
                let length = self.expr()?;
                let radius = if self.eat_word("radius") {
                    self.expr()?
                } else {
                    Expr::Lit(Value::Int(0))
                };
                Stmt::Line {
                    kind,
                    amount,
                    target,
                    length,
                    radius,
                }
            }
            "set" => {
                self.advance();
                let scope = self.scope()?;
                self.expect_word("var")?;
                let name = self.string("a variable name")?;
                self.expect(TokenKind::Assign, "`=`")?;
                Stmt::SetVar {
                    scope,
                    name,
                    value: self.expr()?,
                }
            }
            "add" => {
                self.advance();
                let scope = self.scope()?;
                if self.eat_word("tag") {
                    Stmt::AddTag {
                        scope,
                        tag: self.string("a tag string")?,
                    }
                } else {
                    self.expect_word("var")?;
                    let name = self.string("a variable name")?;
                    self.expect_word("by")?;
                    Stmt::AddVar {
                        scope,
                        name,
                        delta: self.expr()?,
                    }
                }
            }
            "remove" => {
                self.advance();
                let scope = self.scope()?;
                if self.eat_word("tag") {
                    Stmt::RemoveTag {
                        scope,
                        tag: self.string("a tag string")?,
                    }
                } else {
                    self.expect_word("var")?;
                    Stmt::RemoveVar {
                        scope,
                        name: self.string("a variable name")?,
                    }
                }
            }
            "consume" => {
                self.advance();
                self.expect_word("mp")?;
                self.expect(TokenKind::Assign, "`=`")?;
                Stmt::ConsumeMp(self.expr()?)
            }
            "if" => {
                self.advance();
                let cond = self.cond()?;
                self.expect_word("then")?;
                let then = self.body()?;
                let otherwise = self.else_body()?;
                Stmt::If {
                    cond,
                    then,
                    otherwise,
                }
            }
            "repeat" => {
                self.advance();
                let times = self.expr()?;
                self.expect_word("times")?;
                Stmt::Repeat {
                    times,
                    body: self.body()?,
                }
            }
            "parallel" => {
                self.advance();
                Stmt::Parallel(self.braced_block()?)
            }
            "for" => {
                self.advance();
                self.expect_word("each")?;
                let selector = self.selector()?;
                self.expect_word("do")?;
                Stmt::ForEach {
                    selector,
                    body: self.body()?,
                }
            }
            "chance" => {
                self.advance();
                let percent = self.expr()?;
                self.expect(TokenKind::Percent, "`%`")?;
                self.expect_word("then")?;
                let then = self.body()?;
                let otherwise = self.else_body()?;
                Stmt::Chance {
                    percent,
                    then,
                    otherwise,
                }
            }
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::UnknownKeyword,
                    format!("unknown statement `{other}`"),
                    pos,
                ));
            }
        };
        Ok(Spanned::new(stmt, pos))
    }

    fn damage_kind(&mut self) -> DamageKind {
        for (word, kind) in [
            ("physical", DamageKind::Physical),
            ("magic", DamageKind::Magic),
            ("true", DamageKind::True),
        ] {
            if self.eat_word(word) {
                return kind;
            }
        }
        DamageKind::Physical
    }

    fn else_body(&mut self) -> ParseResult<Option<Block>> {
        if self.eat_word("else") {
            Ok(Some(self.body()?))
        } else {
            Ok(None)
        }
    }

    fn body(&mut self) -> ParseResult<Block> {
        if self.at(&TokenKind::LBrace) {
            return self.braced_block();
        }
        let pos = self.pos();
        let stmt = self.nested(Self::stmt)?;
        Ok(Block {
            stmts: vec![stmt],
            braced: false,
            pos,
        })
    }

    fn braced_block(&mut self) -> ParseResult<Block> {
        let pos = self.expect(TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        loop {
            self.skip_semis();
            if self.eat(&TokenKind::RBrace) {
                return Ok(Block {
                    stmts,
                    braced: true,
                    pos,
                });
            }
            if self.at(&TokenKind::Eof) {
                return Err(self.unexpected("`}`"));
            }
            stmts.push(self.nested(Self::stmt)?);
        }
    }

    fn reference(&mut self) -> ParseResult<Ref> {
        let word = self.ident("a unit reference (self, target, it or unit \"id\")")?;
        match word.node.as_str() {
            "self" | "caster" => Ok(Ref::Caster),
            "target" => Ok(Ref::Target),
            "it" => Ok(Ref::It),
            "unit" => Ok(Ref::Unit(self.string("a unit id")?)),
            other => Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                format!("expected a unit reference, found `{other}`"),
                word.pos,
            )),
        }
    }

    fn scope(&mut self) -> ParseResult<Scope> {
        if self.eat_word("global") {
            return Ok(Scope::Global);
        }
        if self.eat_word("tile") {
            if self.eat_word("at") {
                return Ok(Scope::TileAt(self.reference()?));
            }
            self.expect(TokenKind::LParen, "`(` or `at`")?;
            let x = self.expr()?;
            self.expect(TokenKind::Comma, "`,`")?;
            let y = self.expr()?;
            self.expect(TokenKind::RParen, "`)`")?;
            return Ok(Scope::Tile(x, y));
        }
        Ok(Scope::Unit(self.reference()?))
    }

    // ------------------------------------------------------------------
    // Selectors
    // ------------------------------------------------------------------

    fn selector(&mut self) -> ParseResult<Spanned<Selector>> {
        let pos = self.pos();
        let pool = match self.ident("`units`, `enemies` or `allies`")? {
            w if w.node == "units" => Pool::Units,
            w if w.node == "enemies" => Pool::Enemies,
            w if w.node == "allies" => Pool::Allies,
            w => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidValue,
                    format!("`{}` is not a selector (units, enemies, allies)", w.node),
                    w.pos,
                ));
            }
        };
        let mut selector = Selector::new(pool);

        loop {
            let at = self.pos();
            if self.eat_word("nearest") {
                selector.order = Some(Order::Nearest);
            } else if self.eat_word("farthest") {
                selector.order = Some(Order::Farthest);
            } else if self.eat_word("limit") {
                selector.limit = Some(Spanned::new(self.expr()?, at));
            } else if self.eat_word("with") {
                self.expect_word("tag")?;
                selector.with_tags.push(self.string("a tag string")?);
            } else if self.eat_word("in") {
                if self.eat_word("range") {
                    selector.range = Some(Spanned::new(self.expr()?, at));
                    if self.eat_word("of") {
                        selector.anchor = Some(self.reference()?);
                    }
                } else if self.eat_word("line") {
                    selector.shape = Some(Spanned::new(self.line_shape()?, at));
                } else if self.eat_word("cone") {
                    selector.shape = Some(Spanned::new(self.cone_shape()?, at));
                } else {
                    return Err(self.unexpected("`range`, `line` or `cone`"));
                }
            } else {
                return Ok(Spanned::new(selector, pos));
            }
        }
    }

    fn line_shape(&mut self) -> ParseResult<ShapeSpec> {
        self.expect_word("length")?;
        let length = self.expr()?;
        let (mut dir, mut width) = (None, None);
        loop {
            if self.eat_word("dir") {
                dir = Some(self.parse_word::<Direction>("direction")?);
            } else if self.eat_word("width") {
                width = Some(self.expr()?);
            } else {
                return Ok(ShapeSpec::Line { length, dir, width });
            }
        }
    }

    fn cone_shape(&mut self) -> ParseResult<ShapeSpec> {
        self.expect_word("radius")?;
        let radius = self.expr()?;
        let (mut angle, mut dir) = (None, None);
        loop {
            if self.eat_word("angle") {
                angle = Some(self.expr()?);
            } else if self.eat_word("dir") {
                dir = Some(self.parse_word::<Direction>("direction")?);
            } else {
                return Ok(ShapeSpec::Cone { radius, angle, dir });
            }
        }
    }

    // ------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------

    fn cond(&mut self) -> ParseResult<Cond> {
        let mut lhs = self.and_cond()?;
        let mut links = 0;
        while self.eat_word("or") {
            self.chain_link(&mut links)?;
            let rhs = self.and_cond()?;
            lhs = Cond::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_cond(&mut self) -> ParseResult<Cond> {
        let mut lhs = self.not_cond()?;
        let mut links = 0;
        while self.eat_word("and") {
            self.chain_link(&mut links)?;
            let rhs = self.not_cond()?;
            lhs = Cond::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not_cond(&mut self) -> ParseResult<Cond> {
        if self.eat_word("not") {
            return Ok(Cond::Not(Box::new(self.nested(Self::not_cond)?)));
        }
        self.cond_atom()
    }

    fn cond_atom(&mut self) -> ParseResult<Cond> {
        let pos = self.pos();
        if self.eat_word("chance") {
            let percent = self.expr()?;
            self.expect(TokenKind::Percent, "`%`")?;
            return Ok(Cond::Chance(Spanned::new(percent, pos)));
        }

        if self.at_word("global") && self.word_at(1) == Some("has") {
            self.advance();
            self.advance();
            self.expect_word("tag")?;
            return Ok(Cond::GlobalHasTag(self.string("a tag string")?));
        }

        if self.word_at(0).is_some_and(|w| REF_WORDS.contains(&w)) {
            let saved = self.cursor;
            let reference = self.reference()?;
            if self.eat_word("has") {
                self.expect_word("tag")?;
                return Ok(Cond::HasTag(reference, self.string("a tag string")?));
            }
            self.cursor = saved;
        }

        if self.at(&TokenKind::LParen) {
            let saved = self.cursor;
            self.advance();
            if let Ok(inner) = self.nested(Self::cond) {
                if self.eat(&TokenKind::RParen) && !self.at_operator() {
                    return Ok(inner);
                }
            }
            self.cursor = saved;
        }

        let lhs = self.expr()?;
        let op = match self.peek().kind {
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Le => CmpOp::Le,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Ge => CmpOp::Ge,
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::NotEq => CmpOp::Ne,
            _ => return Ok(Cond::Truthy(lhs)),
        };
        self.advance();
        let rhs = self.expr()?;
        Ok(Cond::Cmp(op, lhs, rhs))
    }

    fn at_operator(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Lt
                | TokenKind::Le
                | TokenKind::Gt
                | TokenKind::Ge
                | TokenKind::EqEq
                | TokenKind::NotEq
        )
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.term()?;
        let mut links = 0;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            self.chain_link(&mut links)?;
            let rhs = self.term()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.unary()?;
        let mut links = 0;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            self.chain_link(&mut links)?;
            let rhs = self.unary()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.eat(&TokenKind::Minus) {
            return Ok(Expr::Neg(Box::new(self.nested(Self::unary)?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::Lit(Value::Int(n)))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::Lit(Value::Float(f)))
            }
            TokenKind::Str(text) => {
                self.advance();
                Ok(Expr::Lit(Value::Str(text)))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.nested(Self::expr)?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::Ident(word) => match word.as_str() {
                "true" => {
                    self.advance();
                    Ok(Expr::Lit(Value::Bool(true)))
                }
                "false" => {
                    self.advance();
                    Ok(Expr::Lit(Value::Bool(false)))
                }
                "turn" => {
                    self.advance();
                    Ok(Expr::Turn)
                }
                "global" => {
                    self.advance();
                    self.expect(TokenKind::Dot, "`.`")?;
                    Ok(Expr::GlobalVar(self.var_name()?))
                }
                w if REF_WORDS.contains(&w) => {
                    let reference = self.reference()?;
                    self.expect(TokenKind::Dot, "`.` after a unit reference")?;
                    Ok(Expr::UnitVar(reference, self.var_name()?))
                }
                _ => Err(self.unexpected("an expression")),
            },
            _ => Err(self.unexpected("an expression")),
        }
    }
}
