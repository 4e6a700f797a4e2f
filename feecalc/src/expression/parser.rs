use super::ast::{BinaryOperator, Expression, LogicalOperator, UnaryOperator};
use crate::error::ExpressionError;
use crate::resource_limits::ResourceLimits;
use crate::Value;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "src/expression/grammar.pest"]
pub struct ExpressionParser;

/// Tracks expression nesting while building the tree
struct DepthTracker {
    depth: usize,
    max_depth: usize,
}

impl DepthTracker {
    fn new(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    fn push(&mut self) -> Result<(), ExpressionError> {
        self.push_levels(1)
    }

    fn push_levels(&mut self, levels: usize) -> Result<(), ExpressionError> {
        self.depth = self.depth.saturating_add(levels);
        if self.depth > self.max_depth {
            return Err(depth_exceeded(self.max_depth, self.depth));
        }
        Ok(())
    }

    fn pop(&mut self) {
        self.pop_levels(1);
    }

    fn pop_levels(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }
}

fn depth_exceeded(max_depth: usize, actual: usize) -> ExpressionError {
    ExpressionError::ResourceLimitExceeded {
        limit_name: "max_expression_depth".to_string(),
        limit_value: max_depth.to_string(),
        actual_value: actual.to_string(),
    }
}

/// Parse expression text into a syntax tree
pub fn parse(text: &str, limits: &ResourceLimits) -> Result<Expression, ExpressionError> {
    // Reject runaway nesting before the recursive descent sees it
    let nesting = nesting_upper_bound(text);
    if nesting > limits.max_expression_depth {
        return Err(depth_exceeded(limits.max_expression_depth, nesting));
    }

    let mut pairs = ExpressionParser::parse(Rule::program, text).map_err(|e| {
        let (line, col) = match &e.line_col {
            pest::error::LineColLocation::Pos(pos) => *pos,
            pest::error::LineColLocation::Span(start, _) => *start,
        };
        ExpressionError::Parse(format!(
            "{} at {}:{} in '{}'",
            e.variant, line, col, text
        ))
    })?;

    let expression = pairs
        .next()
        .and_then(|program| program.into_inner().next())
        .ok_or_else(|| ExpressionError::Parse(format!("Empty expression '{}'", text)))?;

    let mut depth = DepthTracker::new(limits.max_expression_depth);
    parse_node(expression, &mut depth)
}

/// Upper bound on the grammar's recursion for `text`
///
/// Counts the deepest bracket nesting outside string literals plus every
/// `?` seen so far, since each ternary nests another level.
fn nesting_upper_bound(text: &str) -> usize {
    let mut ternaries = 0usize;
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '?' => {
                ternaries += 1;
                deepest = deepest.max(depth + ternaries);
            }
            '(' | '[' => {
                depth += 1;
                deepest = deepest.max(depth + ternaries);
            }
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

fn parse_node(pair: Pair<Rule>, depth: &mut DepthTracker) -> Result<Expression, ExpressionError> {
    match pair.as_rule() {
        Rule::expression => {
            depth.push()?;
            let inner = single_child(pair)?;
            let result = parse_node(inner, depth);
            depth.pop();
            result
        }
        Rule::ternary => parse_ternary(pair, depth),
        Rule::or_expr
        | Rule::and_expr
        | Rule::equality
        | Rule::comparison
        | Rule::additive
        | Rule::multiplicative => parse_operator_chain(pair, depth),
        Rule::unary => parse_unary(pair, depth),
        Rule::primary => parse_node(single_child(pair)?, depth),
        Rule::call => parse_call(pair, depth),
        Rule::array => Ok(Expression::Array(parse_arguments(pair, depth)?)),
        Rule::identifier => Ok(Expression::Variable(pair.as_str().to_string())),
        Rule::nil_literal => Ok(Expression::Literal(Value::Null)),
        Rule::boolean_literal => Ok(Expression::Literal(Value::Bool(pair.as_str() == "true"))),
        Rule::number_literal => parse_number_literal(pair.as_str()),
        Rule::string_literal => parse_string_literal(pair),
        other => Err(ExpressionError::Parse(format!(
            "Unexpected syntax {:?} in '{}'",
            other,
            pair.as_str()
        ))),
    }
}

fn single_child(pair: Pair<Rule>) -> Result<Pair<Rule>, ExpressionError> {
    let text = pair.as_str().to_string();
    pair.into_inner()
        .next()
        .ok_or_else(|| ExpressionError::Parse(format!("Incomplete expression '{}'", text)))
}

fn parse_ternary(pair: Pair<Rule>, depth: &mut DepthTracker) -> Result<Expression, ExpressionError> {
    let text = pair.as_str().to_string();
    let mut pairs = pair.into_inner();
    let condition_pair = pairs
        .next()
        .ok_or_else(|| ExpressionError::Parse(format!("Missing condition in '{}'", text)))?;

    let Some(then_pair) = pairs.next() else {
        return parse_node(condition_pair, depth);
    };
    let else_pair = pairs
        .next()
        .ok_or_else(|| ExpressionError::Parse(format!("Missing else branch in '{}'", text)))?;

    depth.push()?;
    let condition = parse_node(condition_pair, depth)?;
    let then_branch = parse_node(then_pair, depth)?;
    let else_branch = parse_node(else_pair, depth)?;
    depth.pop();

    Ok(Expression::Conditional {
        condition: Box::new(condition),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
    })
}

/// Left-associative chain: operand (operator operand)*
///
/// Each operator nests the chain one level deeper, so the whole chain is
/// charged against the depth limit before any operand is built.
fn parse_operator_chain(
    pair: Pair<Rule>,
    depth: &mut DepthTracker,
) -> Result<Expression, ExpressionError> {
    let text = pair.as_str().to_string();
    let mut pairs = pair.into_inner();
    let operators = pairs.clone().count() / 2;
    depth.push_levels(operators)?;
    let mut left = parse_node(
        pairs
            .next()
            .ok_or_else(|| ExpressionError::Parse(format!("Missing left operand in '{}'", text)))?,
        depth,
    )?;

    while let Some(op_pair) = pairs.next() {
        let right = parse_node(
            pairs.next().ok_or_else(|| {
                ExpressionError::Parse(format!(
                    "Missing right operand after '{}' in '{}'",
                    op_pair.as_str(),
                    text
                ))
            })?,
            depth,
        )?;
        left = combine(left, op_pair.as_str(), right)?;
    }

    depth.pop_levels(operators);
    Ok(left)
}

fn combine(left: Expression, operator: &str, right: Expression) -> Result<Expression, ExpressionError> {
    let logical = match operator {
        "&&" | "and" => Some(LogicalOperator::And),
        "||" | "or" => Some(LogicalOperator::Or),
        _ => None,
    };
    if let Some(operator) = logical {
        return Ok(Expression::Logical {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        });
    }

    let operator = match operator {
        "+" => BinaryOperator::Add,
        "-" => BinaryOperator::Subtract,
        "*" => BinaryOperator::Multiply,
        "/" => BinaryOperator::Divide,
        "%" => BinaryOperator::Modulo,
        "==" => BinaryOperator::Equal,
        "!=" => BinaryOperator::NotEqual,
        "<" => BinaryOperator::LessThan,
        "<=" => BinaryOperator::LessThanOrEqual,
        ">" => BinaryOperator::GreaterThan,
        ">=" => BinaryOperator::GreaterThanOrEqual,
        other => {
            return Err(ExpressionError::Parse(format!(
                "Unknown operator '{}'",
                other
            )))
        }
    };
    Ok(Expression::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    })
}

fn parse_unary(pair: Pair<Rule>, depth: &mut DepthTracker) -> Result<Expression, ExpressionError> {
    let mut operators = Vec::new();
    let mut operand_pair = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::op_unary => operators.push(match inner.as_str() {
                "-" => UnaryOperator::Negate,
                _ => UnaryOperator::Not,
            }),
            _ => operand_pair = Some(inner),
        }
    }

    let operand_pair = operand_pair
        .ok_or_else(|| ExpressionError::Parse("Missing operand after unary operator".to_string()))?;

    depth.push_levels(operators.len())?;
    let mut expression = parse_node(operand_pair, depth)?;
    depth.pop_levels(operators.len());

    // Innermost operator applies first
    for operator in operators.into_iter().rev() {
        expression = Expression::Unary {
            operator,
            operand: Box::new(expression),
        };
    }
    Ok(expression)
}

fn parse_call(pair: Pair<Rule>, depth: &mut DepthTracker) -> Result<Expression, ExpressionError> {
    let text = pair.as_str().to_string();
    let mut pairs = pair.into_inner();
    let name = pairs
        .next()
        .ok_or_else(|| ExpressionError::Parse(format!("Missing function name in '{}'", text)))?
        .as_str()
        .to_string();

    let arguments = match pairs.next() {
        Some(arguments) => parse_expression_list(arguments, depth)?,
        None => Vec::new(),
    };
    Ok(Expression::Call { name, arguments })
}

/// Elements of an array literal
fn parse_arguments(pair: Pair<Rule>, depth: &mut DepthTracker) -> Result<Vec<Expression>, ExpressionError> {
    match pair.into_inner().next() {
        Some(arguments) => parse_expression_list(arguments, depth),
        None => Ok(Vec::new()),
    }
}

fn parse_expression_list(
    pair: Pair<Rule>,
    depth: &mut DepthTracker,
) -> Result<Vec<Expression>, ExpressionError> {
    pair.into_inner()
        .map(|expression| parse_node(expression, depth))
        .collect()
}

fn parse_number_literal(text: &str) -> Result<Expression, ExpressionError> {
    let is_float = text.contains(['.', 'e', 'E']);
    let value = if is_float {
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|e| ExpressionError::Parse(format!("Invalid number '{}': {}", text, e)))?
    } else {
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ExpressionError::Parse(format!("Integer '{}' is out of range", text)))?
    };
    Ok(Expression::Literal(value))
}

fn parse_string_literal(pair: Pair<Rule>) -> Result<Expression, ExpressionError> {
    let raw = pair.into_inner().next().map_or("", |content| content.as_str());
    Ok(Expression::Literal(Value::String(unescape(raw)?)))
}

fn unescape(raw: &str) -> Result<String, ExpressionError> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some(escaped @ ('\\' | '"' | '\'')) => result.push(escaped),
            Some(other) => {
                return Err(ExpressionError::Parse(format!(
                    "Unknown escape sequence '\\{}'",
                    other
                )))
            }
            None => {
                return Err(ExpressionError::Parse(
                    "Unterminated escape sequence".to_string(),
                ))
            }
        }
    }
    Ok(result)
}
