//! Chain-aware semantic checks over a parsed query.
//!
//! Two visitor passes run over the statement. [`Declarations`] first records
//! every name the statement introduces (CTEs, table aliases, projection
//! aliases) and every chain table it reads. [`Checker`] then walks the tree
//! depth-first in source order and stops at the first violation.
//!
//! A query block's declarations (CTE names, projection aliases, `FROM`
//! entries, `USING` lists and named windows) are checked when the block is
//! entered, before any expression in it.
//!
//! Table names resolve against the CTEs in scope. A CTE body sees only the
//! CTEs listed before it (all of them under `WITH RECURSIVE`), so
//! `WITH blocks AS (SELECT * FROM blocks)` still reads the chain table.

use crate::errors::{Position, RuleScope, ValidateError};
use crate::registry::DialectRules;
use crate::sql::position::{self, Role};
use query_validator_types::ChainType;
use sqlparser::ast::{
    Expr, Ident, Join, JoinConstraint, JoinOperator, NamedWindowDefinition, NamedWindowExpr,
    ObjectName, Query, Select, SelectItem, SetExpr, Statement, TableAlias, TableFactor,
    TableWithJoins, Visit, Visitor, WindowType,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ops::ControlFlow;
use tracing::trace;

fn lower(ident: &Ident) -> String {
    ident.value.to_ascii_lowercase()
}

fn flow(result: Result<(), ValidateError>) -> ControlFlow<ValidateError> {
    match result {
        Ok(()) => ControlFlow::Continue(()),
        Err(err) => ControlFlow::Break(err),
    }
}

/// Selects making up a query body, left to right. Nested parenthesized
/// queries are visited as queries of their own.
pub(crate) fn body_selects(body: &SetExpr) -> Vec<&Select> {
    match body {
        SetExpr::Select(select) => vec![select.as_ref()],
        SetExpr::SetOperation { left, right, .. } => {
            let mut selects = body_selects(left);
            selects.extend(body_selects(right));
            selects
        }
        _ => Vec::new(),
    }
}

fn push_factors<'a>(factor: &'a TableFactor, out: &mut Vec<&'a TableFactor>) {
    out.push(factor);
    if let TableFactor::NestedJoin {
        table_with_joins, ..
    } = factor
    {
        push_joined(table_with_joins, out);
    }
}

fn push_joined<'a>(twj: &'a TableWithJoins, out: &mut Vec<&'a TableFactor>) {
    push_factors(&twj.relation, out);
    for join in &twj.joins {
        push_factors(&join.relation, out);
    }
}

/// `FROM` entries of a select, nested joins flattened.
fn select_factors(select: &Select) -> Vec<&TableFactor> {
    let mut factors = Vec::new();
    for twj in &select.from {
        push_joined(twj, &mut factors);
    }
    factors
}

fn factor_alias(factor: &TableFactor) -> Option<&TableAlias> {
    match factor {
        TableFactor::Table { alias, .. }
        | TableFactor::Derived { alias, .. }
        | TableFactor::TableFunction { alias, .. }
        | TableFactor::Function { alias, .. }
        | TableFactor::UNNEST { alias, .. }
        | TableFactor::NestedJoin { alias, .. } => alias.as_ref(),
        _ => None,
    }
}

/// Joins of a select, nested joins flattened.
fn select_joins(select: &Select) -> Vec<&Join> {
    fn push<'a>(twj: &'a TableWithJoins, out: &mut Vec<&'a Join>) {
        if let TableFactor::NestedJoin {
            table_with_joins, ..
        } = &twj.relation
        {
            push(table_with_joins, out);
        }
        for join in &twj.joins {
            if let TableFactor::NestedJoin {
                table_with_joins, ..
            } = &join.relation
            {
                push(table_with_joins, out);
            }
            out.push(join);
        }
    }
    let mut joins = Vec::new();
    for twj in &select.from {
        push(twj, &mut joins);
    }
    joins
}

fn join_constraint(operator: &JoinOperator) -> Option<&JoinConstraint> {
    match operator {
        JoinOperator::Inner(constraint)
        | JoinOperator::LeftOuter(constraint)
        | JoinOperator::RightOuter(constraint)
        | JoinOperator::FullOuter(constraint)
        | JoinOperator::LeftSemi(constraint)
        | JoinOperator::RightSemi(constraint)
        | JoinOperator::LeftAnti(constraint)
        | JoinOperator::RightAnti(constraint)
        | JoinOperator::AsOf { constraint, .. } => Some(constraint),
        JoinOperator::CrossJoin | JoinOperator::CrossApply | JoinOperator::OuterApply => None,
    }
}

/// Names a statement introduces and the chain tables it reads.
#[derive(Debug, Default)]
pub(crate) struct Declarations {
    pub ctes: BTreeSet<String>,
    /// Table names read from storage, lowercased. CTE references are not
    /// included.
    pub relations: BTreeSet<String>,
    pub table_aliases: BTreeSet<String>,
    /// Projection aliases and CTE/derived table column lists.
    pub output_aliases: BTreeSet<String>,
    pub chain_tables: BTreeSet<&'static str>,
    /// Chain table behind each qualifier; `None` when the qualifier is bound
    /// to something else somewhere in the statement.
    pub qualified: BTreeMap<String, Option<&'static str>>,
}

impl Declarations {
    pub fn collect(statement: &Statement, rules: &DialectRules) -> Self {
        let mut collector = Collector {
            rules,
            decl: Declarations::default(),
            scopes: Vec::new(),
        };
        let _ = statement.visit(&mut collector);
        collector.decl
    }

    fn is_qualifier(&self, name: &str) -> bool {
        self.table_aliases.contains(name) || self.ctes.contains(name) || self.relations.contains(name)
    }

    fn bind_qualifier(&mut self, name: String, table: Option<&'static str>) {
        self.qualified
            .entry(name)
            .and_modify(|bound| {
                if *bound != table {
                    *bound = None;
                }
            })
            .or_insert(table);
    }
}

/// CTE names visible inside one query.
#[derive(Debug, Default)]
struct Scope {
    visible: BTreeSet<String>,
    /// Scopes for this query's CTE bodies, consumed in order as the walk
    /// enters them.
    pending: VecDeque<BTreeSet<String>>,
}

struct Collector<'r> {
    rules: &'r DialectRules,
    decl: Declarations,
    scopes: Vec<Scope>,
}

impl Collector<'_> {
    fn refers_to_cte(&self, name: &str) -> bool {
        self.scopes
            .last()
            .map_or(false, |scope| scope.visible.contains(name))
    }
}

impl Visitor for Collector<'_> {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<()> {
        // CTE bodies are the first queries entered under their parent.
        let inherited = match self.scopes.last_mut() {
            Some(parent) => parent
                .pending
                .pop_front()
                .unwrap_or_else(|| parent.visible.clone()),
            None => BTreeSet::new(),
        };

        let mut scope = Scope {
            visible: inherited,
            pending: VecDeque::new(),
        };
        if let Some(with) = &query.with {
            let names: Vec<String> = with
                .cte_tables
                .iter()
                .map(|cte| lower(&cte.alias.name))
                .collect();
            let mut earlier = scope.visible.clone();
            for (cte, name) in with.cte_tables.iter().zip(&names) {
                let mut body = earlier.clone();
                if with.recursive {
                    body.extend(names.iter().cloned());
                }
                scope.pending.push_back(body);
                earlier.insert(name.clone());

                self.decl.ctes.insert(name.clone());
                self.decl.bind_qualifier(name.clone(), None);
                self.decl
                    .output_aliases
                    .extend(cte.alias.columns.iter().map(lower));
            }
            scope.visible = earlier;
        }
        self.scopes.push(scope);

        for select in body_selects(&query.body) {
            for item in &select.projection {
                if let SelectItem::ExprWithAlias { alias, .. } = item {
                    self.decl.output_aliases.insert(lower(alias));
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<()> {
        self.scopes.pop();
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, factor: &TableFactor) -> ControlFlow<()> {
        let mut bound = None;
        if let TableFactor::Table { name, .. } = factor {
            if let Some(last) = name.0.last() {
                let key = lower(last);
                if !self.refers_to_cte(&key) {
                    if let Some(table) = self.rules.table(&key) {
                        self.decl.chain_tables.insert(table.name);
                        bound = Some(table.name);
                    }
                    self.decl.relations.insert(key.clone());
                }
                self.decl.bind_qualifier(key, bound);
            }
        }
        if let Some(alias) = factor_alias(factor) {
            self.decl.table_aliases.insert(lower(&alias.name));
            self.decl.bind_qualifier(lower(&alias.name), bound);
            self.decl
                .output_aliases
                .extend(alias.columns.iter().map(lower));
        }
        ControlFlow::Continue(())
    }
}

/// Source-order rule walk.
struct Checker<'a> {
    rules: &'a DialectRules,
    source: &'a str,
    decl: &'a Declarations,
    /// Union of the columns of every chain table the statement reads.
    columns: BTreeSet<&'static str>,
    /// Occurrences handled so far, per role and word.
    seen: BTreeMap<(Role, String), usize>,
}

/// Which textual occurrence an identifier is.
#[derive(Debug, Clone, Copy)]
struct Site {
    role: Role,
    index: usize,
}

impl Checker<'_> {
    fn chain(&self) -> Option<ChainType> {
        match self.rules.scope {
            RuleScope::Chain(chain) => Some(chain),
            RuleScope::Render => None,
        }
    }

    fn see(&mut self, ident: &Ident, role: Role) -> Site {
        let word = match ident.quote_style {
            Some(_) => ident.value.clone(),
            None => lower(ident),
        };
        let count = self.seen.entry((role, word)).or_insert(0);
        let index = *count;
        *count += 1;
        Site { role, index }
    }

    fn locate(&self, ident: &Ident, site: Site) -> Option<Position> {
        position::locate_nth(self.source, &ident.value, site.role, site.index)
    }

    fn check_reserved(&self, ident: &Ident, site: Site) -> Result<(), ValidateError> {
        if ident.quote_style.is_none() && self.rules.is_reserved(&ident.value) {
            return Err(ValidateError::ReservedKeyword {
                keyword: ident.value.clone(),
                scope: self.rules.scope,
                position: self.locate(ident, site),
            });
        }
        Ok(())
    }

    fn declare(&mut self, ident: &Ident, role: Role) -> Result<(), ValidateError> {
        let site = self.see(ident, role);
        self.check_reserved(ident, site)
    }

    fn check_table(&mut self, name: &ObjectName) -> Result<(), ValidateError> {
        let mut last = None;
        for part in &name.0 {
            let site = self.see(part, Role::Declaration);
            self.check_reserved(part, site)?;
            last = Some((part, site));
        }
        let (Some(chain), Some((table, site))) = (self.chain(), last) else {
            return Ok(());
        };
        let key = lower(table);
        if self.decl.ctes.contains(&key) || self.rules.table(&key).is_some() {
            return Ok(());
        }
        Err(ValidateError::UnknownTable {
            table: table.value.clone(),
            chain,
            position: self.locate(table, site),
        })
    }

    fn check_qualifier(&self, qualifier: &Ident, site: Site) -> Result<(), ValidateError> {
        let Some(chain) = self.chain() else {
            return Ok(());
        };
        if self.decl.is_qualifier(&lower(qualifier)) {
            return Ok(());
        }
        Err(ValidateError::UnknownQualifier {
            qualifier: qualifier.value.clone(),
            chain,
            position: self.locate(qualifier, site),
        })
    }

    /// Columns must exist in a table the statement reads; a qualifier bound
    /// to exactly one chain table narrows that to its own columns.
    fn check_column(
        &self,
        column: &Ident,
        site: Site,
        qualifier: Option<&Ident>,
    ) -> Result<(), ValidateError> {
        let Some(chain) = self.chain() else {
            return Ok(());
        };
        let key = lower(column);
        let bound = qualifier
            .and_then(|qualifier| self.decl.qualified.get(&lower(qualifier)).copied().flatten())
            .and_then(|table| self.rules.table(table));
        let known = match bound {
            Some(table) => table.has_column(&key),
            None => self.columns.contains(key.as_str()) || self.decl.output_aliases.contains(&key),
        };
        if known {
            return Ok(());
        }
        Err(ValidateError::UnknownColumn {
            column: column.value.clone(),
            chain,
            position: self.locate(column, site),
        })
    }

    fn check_function(&mut self, name: &ObjectName) -> Result<(), ValidateError> {
        let Some(function) = name.0.last() else {
            return Ok(());
        };
        let site = self.see(function, Role::Reference);
        if self.rules.allows_function(&function.value) {
            return Ok(());
        }
        Err(ValidateError::FunctionNotAllowed {
            function: function.value.clone(),
            scope: self.rules.scope,
            position: self.locate(function, site),
        })
    }

    fn enter_query(&mut self, query: &Query) -> Result<(), ValidateError> {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.declare(&cte.alias.name, Role::Declaration)?;
                for column in &cte.alias.columns {
                    self.declare(column, Role::Reference)?;
                }
            }
        }
        for select in body_selects(&query.body) {
            self.enter_select(select)?;
        }
        Ok(())
    }

    fn enter_select(&mut self, select: &Select) -> Result<(), ValidateError> {
        if select.into.is_some() {
            return Err(ValidateError::UnsupportedStatement {
                statement: "SELECT INTO".to_string(),
                scope: self.rules.scope,
            });
        }
        for item in &select.projection {
            match item {
                SelectItem::ExprWithAlias { alias, .. } => {
                    self.declare(alias, Role::Declaration)?
                }
                SelectItem::QualifiedWildcard(name, _) => {
                    let mut last = None;
                    for part in &name.0 {
                        let site = self.see(part, Role::Reference);
                        self.check_reserved(part, site)?;
                        last = Some((part, site));
                    }
                    if let Some((qualifier, site)) = last {
                        self.check_qualifier(qualifier, site)?;
                    }
                }
                _ => {}
            }
        }
        for factor in select_factors(select) {
            if let TableFactor::Table { name, .. } = factor {
                self.check_table(name)?;
            }
            if let Some(alias) = factor_alias(factor) {
                self.declare(&alias.name, Role::Declaration)?;
                for column in &alias.columns {
                    self.declare(column, Role::Reference)?;
                }
            }
        }
        for join in select_joins(select) {
            if let Some(JoinConstraint::Using(columns)) = join_constraint(&join.join_operator) {
                for column in columns {
                    let site = self.see(column, Role::JoinColumn);
                    self.check_reserved(column, site)?;
                    self.check_column(column, site, None)?;
                }
            }
        }
        for NamedWindowDefinition(name, window) in &select.named_window {
            self.declare(name, Role::Declaration)?;
            if let NamedWindowExpr::NamedWindow(base) = window {
                self.declare(base, Role::Reference)?;
            }
        }
        Ok(())
    }

    fn check_expr(&mut self, expr: &Expr) -> Result<(), ValidateError> {
        match expr {
            Expr::Identifier(ident) => {
                let site = self.see(ident, Role::Reference);
                self.check_reserved(ident, site)?;
                self.check_column(ident, site, None)
            }
            Expr::CompoundIdentifier(parts) => {
                let mut sites = Vec::with_capacity(parts.len());
                for part in parts {
                    let site = self.see(part, Role::Reference);
                    self.check_reserved(part, site)?;
                    sites.push(site);
                }
                if let ([.., qualifier, column], [.., qualifier_site, column_site]) =
                    (parts.as_slice(), sites.as_slice())
                {
                    self.check_qualifier(qualifier, *qualifier_site)?;
                    self.check_column(column, *column_site, Some(qualifier))?;
                }
                Ok(())
            }
            Expr::Function(function) => {
                self.check_function(&function.name)?;
                if let Some(WindowType::NamedWindow(window)) = &function.over {
                    self.declare(window, Role::Reference)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl Visitor for Checker<'_> {
    type Break = ValidateError;

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<ValidateError> {
        flow(self.enter_query(query))
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<ValidateError> {
        flow(self.check_expr(expr))
    }
}

/// Run every semantic rule of `rules` over `statement`.
///
/// `source` is the text the statement was parsed from, used to locate
/// offending identifiers.
pub(crate) fn check(
    statement: &Statement,
    rules: &DialectRules,
    source: &str,
) -> Result<(), ValidateError> {
    let decl = Declarations::collect(statement, rules);
    trace!(
        tables = ?decl.chain_tables,
        ctes = decl.ctes.len(),
        aliases = decl.output_aliases.len(),
        "collected declarations"
    );

    let columns = decl
        .chain_tables
        .iter()
        .filter_map(|name| rules.table(name))
        .flat_map(|table| table.columns.iter().copied())
        .collect();
    let mut checker = Checker {
        rules,
        source,
        decl: &decl,
        columns,
        seen: BTreeMap::new(),
    };
    if let ControlFlow::Break(err) = statement.visit(&mut checker) {
        return Err(err);
    }

    if let RuleScope::Chain(chain) = rules.scope {
        if decl.chain_tables.is_empty() {
            return Err(ValidateError::NoChainTable { chain });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    fn parse(sql: &str) -> Statement {
        Parser::parse_sql(&GenericDialect {}, sql).unwrap().remove(0)
    }

    fn run(chain: ChainType, sql: &str) -> Result<(), ValidateError> {
        let registry = Registry::default();
        check(&parse(sql), &registry.rules_for(chain).sql, sql)
    }

    #[test]
    fn declarations_collect_names() {
        let registry = Registry::default();
        let statement = parse(
            "WITH recent AS (SELECT seq AS s FROM transactions) \
             SELECT r.s, e.tx_seq FROM recent r JOIN events e ON r.s = e.tx_seq",
        );
        let decl = Declarations::collect(&statement, &registry.rules_for(ChainType::Sui).sql);
        assert!(decl.ctes.contains("recent"));
        assert!(decl.table_aliases.contains("r"));
        assert!(decl.output_aliases.contains("s"));
        assert_eq!(
            decl.chain_tables.iter().copied().collect::<Vec<_>>(),
            vec!["events", "transactions"]
        );
    }

    #[test]
    fn accepts_known_tables_and_columns() {
        assert!(run(ChainType::Sui, "SELECT seq, gas_used FROM transactions WHERE gas_used > 10").is_ok());
        assert!(run(ChainType::Evm, "SELECT b.height FROM blocks b").is_ok());
    }

    #[test]
    fn reserved_alias_is_rejected_with_position() {
        let err = run(ChainType::Sui, "SELECT t.gas_used AS checkpoint FROM transactions t").unwrap_err();
        assert!(matches!(
            err,
            ValidateError::ReservedKeyword { ref keyword, position: Some(p), .. }
                if keyword == "checkpoint" && p == Position::new(1, 22)
        ));
        assert!(run(ChainType::Evm, "SELECT t.gas_used AS checkpoint FROM transactions t").is_ok());
    }

    #[test]
    fn quoted_reserved_word_is_allowed() {
        assert!(run(
            ChainType::Sui,
            "SELECT t.gas_used AS \"checkpoint\" FROM transactions t"
        )
        .is_ok());
    }

    #[test]
    fn unknown_table_is_reported_before_columns() {
        let err = run(ChainType::Evm, "SELECT foo FROM checkpoint_events").unwrap_err();
        assert!(matches!(err, ValidateError::UnknownTable { ref table, .. } if table == "checkpoint_events"));
    }

    #[test]
    fn unknown_column_and_qualifier() {
        let err = run(ChainType::Aptos, "SELECT nope FROM blocks").unwrap_err();
        assert!(matches!(err, ValidateError::UnknownColumn { ref column, .. } if column == "nope"));

        let err = run(ChainType::Aptos, "SELECT x.height FROM blocks b").unwrap_err();
        assert!(matches!(err, ValidateError::UnknownQualifier { ref qualifier, .. } if qualifier == "x"));
    }

    #[test]
    fn functions_outside_allowlist_fail() {
        let err = run(ChainType::Evm, "SELECT as_uint64(input) FROM transactions").unwrap_err();
        assert!(matches!(err, ValidateError::FunctionNotAllowed { ref function, .. } if function == "as_uint64"));
        assert!(run(ChainType::Evm, "SELECT EVM_AS_UINT256(input) AS v FROM transactions").is_ok());
    }

    #[test]
    fn statement_without_chain_table_fails() {
        let err = run(ChainType::Sui, "SELECT 1").unwrap_err();
        assert_eq!(err, ValidateError::NoChainTable { chain: ChainType::Sui });
    }

    #[test]
    fn subqueries_are_checked() {
        let err = run(
            ChainType::Sui,
            "SELECT seq FROM transactions WHERE seq IN (SELECT tx_seq FROM objects)",
        )
        .unwrap_err();
        assert!(matches!(err, ValidateError::UnknownTable { ref table, .. } if table == "objects"));
    }

    #[test]
    fn cte_shadowing_its_own_table_still_reads_it() {
        let registry = Registry::default();
        let statement = parse("WITH blocks AS (SELECT * FROM blocks) SELECT * FROM blocks");
        let decl = Declarations::collect(&statement, &registry.rules_for(ChainType::Evm).sql);
        assert_eq!(decl.chain_tables.iter().copied().collect::<Vec<_>>(), vec!["blocks"]);
        assert!(run(ChainType::Evm, "WITH blocks AS (SELECT * FROM blocks) SELECT * FROM blocks").is_ok());
    }

    #[test]
    fn later_ctes_see_earlier_ones() {
        let registry = Registry::default();
        let statement = parse(
            "WITH a AS (SELECT height FROM blocks), b AS (SELECT height FROM a) \
             SELECT height FROM b",
        );
        let decl = Declarations::collect(&statement, &registry.rules_for(ChainType::Aptos).sql);
        assert_eq!(decl.chain_tables.iter().copied().collect::<Vec<_>>(), vec!["blocks"]);
        assert!(!decl.relations.contains("a"));
    }

    #[test]
    fn recursive_cte_reading_only_itself_reads_no_chain_table() {
        let err = run(
            ChainType::Evm,
            "WITH RECURSIVE blocks AS (SELECT height FROM blocks) SELECT height FROM blocks",
        )
        .unwrap_err();
        assert_eq!(err, ValidateError::NoChainTable { chain: ChainType::Evm });
    }

    #[test]
    fn column_lists_declare_names() {
        assert!(run(ChainType::Evm, "WITH r(x) AS (SELECT height FROM blocks) SELECT x FROM r").is_ok());
        assert!(run(ChainType::Evm, "WITH r(x) AS (SELECT height FROM blocks) SELECT r.x FROM r").is_ok());
        assert!(run(
            ChainType::Sui,
            "SELECT d.n FROM (SELECT seq FROM transactions) AS d(n) WHERE n > 1"
        )
        .is_ok());
    }

    #[test]
    fn using_lists_are_checked() {
        let sql = "SELECT t.seq FROM transactions t JOIN events e USING (checkpoint)";
        let err = run(ChainType::Sui, sql).unwrap_err();
        assert!(matches!(
            err,
            ValidateError::ReservedKeyword { ref keyword, position: Some(p), .. }
                if keyword == "checkpoint" && p == Position::new(1, 55)
        ));

        assert!(run(ChainType::Sui, "SELECT t.seq FROM transactions t JOIN events e USING (sender)").is_ok());
        let err = run(ChainType::Sui, "SELECT t.seq FROM transactions t JOIN events e USING (colour)")
            .unwrap_err();
        assert!(matches!(err, ValidateError::UnknownColumn { ref column, .. } if column == "colour"));
    }

    #[test]
    fn window_names_and_alias_columns_are_checked_for_reserved_words() {
        let err = run(ChainType::Sui, "SELECT seq FROM transactions WINDOW epoch AS (ORDER BY seq)")
            .unwrap_err();
        assert!(matches!(
            err,
            ValidateError::ReservedKeyword { ref keyword, position: Some(p), .. }
                if keyword == "epoch" && p == Position::new(1, 37)
        ));

        let err = run(
            ChainType::Sui,
            "SELECT x FROM (SELECT seq FROM transactions) AS d(checkpoint)",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidateError::ReservedKeyword { ref keyword, position: Some(p), .. }
                if keyword == "checkpoint" && p == Position::new(1, 51)
        ));
    }

    #[test]
    fn qualified_columns_must_belong_to_their_table() {
        let sql = "SELECT b.tx_hash FROM blocks b JOIN transactions t ON t.block_index = b.block_index";
        let err = run(ChainType::Evm, sql).unwrap_err();
        assert!(matches!(err, ValidateError::UnknownColumn { ref column, .. } if column == "tx_hash"));
        assert!(run(
            ChainType::Evm,
            "SELECT t.tx_hash FROM blocks b JOIN transactions t ON t.block_index = b.block_index"
        )
        .is_ok());
    }

    #[test]
    fn diagnostics_point_at_the_offending_occurrence() {
        // `nope` first appears as an alias; the error is the qualified use.
        let err = run(ChainType::Aptos, "SELECT hash AS nope FROM blocks b WHERE b.nope > 1")
            .unwrap_err();
        assert!(matches!(
            err,
            ValidateError::UnknownColumn { ref column, position: Some(p), .. }
                if column == "nope" && p == Position::new(1, 43)
        ));

        // Same for a word first seen as a table alias.
        let err = run(ChainType::Aptos, "SELECT c.height FROM blocks colour, blocks c WHERE colour > 1").unwrap_err();
        assert!(matches!(
            err,
            ValidateError::UnknownColumn { ref column, position: Some(p), .. }
                if column == "colour" && p == Position::new(1, 52)
        ));
    }

    #[test]
    fn render_rules_skip_schema() {
        let registry = Registry::default();
        let sql = "SELECT anything FROM wherever";
        assert!(check(&parse(sql), registry.render_rules(), sql).is_ok());
    }
}
