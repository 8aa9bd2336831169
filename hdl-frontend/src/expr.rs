use chumsky::prelude::*;

/// Integer expression tree for parameter and range arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(i64),
    Negate(Box<Expression>),
    LogicalNot(Box<Expression>),
    BitwiseNot(Box<Expression>),
    Conditional {
        condition: Box<Expression>,
        when_true: Box<Expression>,
        when_false: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    LogicalOr,
    LogicalAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    ShiftLeft,
    ShiftRight,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Power,
}

fn binary(left: Expression, (op, right): (BinaryOp, Expression)) -> Expression {
    Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn expression_parser() -> impl Parser<char, Expression, Error = Simple<char>> {
    recursive(|expr| {
        // 8'hFF, 'd10, 4'sb1010; x/z/? digits make the literal non-numeric
        let based = filter(|c: &char| c.is_ascii_digit())
            .repeated()
            .then_ignore(just('\''))
            .then_ignore(one_of("sS").or_not())
            .then(one_of("bBoOdDhH"))
            .then(
                filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '?')
                    .repeated()
                    .at_least(1),
            )
            .try_map(|((_size, base), digits): ((Vec<char>, char), Vec<char>), span| {
                let radix = match base.to_ascii_lowercase() {
                    'b' => 2,
                    'o' => 8,
                    'd' => 10,
                    _ => 16,
                };
                let digits: String = digits.into_iter().filter(|c| *c != '_').collect();
                u64::from_str_radix(&digits, radix)
                    .map(|value| value as i64)
                    .map_err(|_| Simple::custom(span, format!("not a numeric literal: {}", digits)))
            });

        let decimal = filter(|c: &char| c.is_ascii_digit())
            .then(filter(|c: &char| c.is_ascii_digit() || *c == '_').repeated())
            .try_map(|(first, rest): (char, Vec<char>), span| {
                let mut digits = String::new();
                digits.push(first);
                digits.extend(rest.into_iter().filter(|c| *c != '_'));
                digits
                    .parse::<i64>()
                    .map_err(|_| Simple::custom(span, format!("integer out of range: {}", digits)))
            });

        let atom = choice((
            based.map(Expression::Number),
            decimal.map(Expression::Number),
            expr.clone().delimited_by(just('('), just(')')),
        ))
        .padded()
        .boxed();

        let unary = one_of("-+!~")
            .padded()
            .repeated()
            .then(atom)
            .foldr(|op, operand| match op {
                '-' => Expression::Negate(Box::new(operand)),
                '!' => Expression::LogicalNot(Box::new(operand)),
                '~' => Expression::BitwiseNot(Box::new(operand)),
                _ => operand,
            })
            .boxed();

        // `**` is right associative
        let power = unary
            .clone()
            .then(just("**").padded().ignore_then(unary).repeated())
            .map(|(first, rest)| {
                let mut operands = vec![first];
                operands.extend(rest);
                let mut iter = operands.into_iter().rev();
                let mut acc = iter.next().unwrap_or(Expression::Number(0));
                for base in iter {
                    acc = Expression::Binary {
                        op: BinaryOp::Power,
                        left: Box::new(base),
                        right: Box::new(acc),
                    };
                }
                acc
            })
            .boxed();

        let product_op = choice((
            just("//").to(BinaryOp::FloorDiv),
            just('*').to(BinaryOp::Mul),
            just('/').to(BinaryOp::Div),
            just('%').to(BinaryOp::Mod),
        ))
        .padded();
        let product = power
            .clone()
            .then(product_op.then(power).repeated())
            .foldl(binary)
            .boxed();

        let sum_op = choice((just('+').to(BinaryOp::Add), just('-').to(BinaryOp::Sub))).padded();
        let sum = product
            .clone()
            .then(sum_op.then(product).repeated())
            .foldl(binary)
            .boxed();

        let shift_op = choice((
            just("<<<").to(BinaryOp::ShiftLeft),
            just(">>>").to(BinaryOp::ShiftRight),
            just("<<").to(BinaryOp::ShiftLeft),
            just(">>").to(BinaryOp::ShiftRight),
        ))
        .padded();
        let shift = sum
            .clone()
            .then(shift_op.then(sum).repeated())
            .foldl(binary)
            .boxed();

        let relational_op = choice((
            just("<=").to(BinaryOp::LessEqual),
            just(">=").to(BinaryOp::GreaterEqual),
            just('<').to(BinaryOp::LessThan),
            just('>').to(BinaryOp::GreaterThan),
        ))
        .padded();
        let relational = shift
            .clone()
            .then(relational_op.then(shift).repeated())
            .foldl(binary)
            .boxed();

        let equality_op = choice((
            just("==").to(BinaryOp::Equal),
            just("!=").to(BinaryOp::NotEqual),
        ))
        .padded();
        let equality = relational
            .clone()
            .then(equality_op.then(relational).repeated())
            .foldl(binary)
            .boxed();

        // a failed right operand rewinds, so `&&` and `||` fall through to
        // the logical levels below
        let bit_and = equality
            .clone()
            .then(just('&').padded().to(BinaryOp::BitwiseAnd).then(equality).repeated())
            .foldl(binary)
            .boxed();
        let bit_xor = bit_and
            .clone()
            .then(just('^').padded().to(BinaryOp::BitwiseXor).then(bit_and).repeated())
            .foldl(binary)
            .boxed();
        let bit_or = bit_xor
            .clone()
            .then(just('|').padded().to(BinaryOp::BitwiseOr).then(bit_xor).repeated())
            .foldl(binary)
            .boxed();

        let logical_and = bit_or
            .clone()
            .then(just("&&").padded().to(BinaryOp::LogicalAnd).then(bit_or).repeated())
            .foldl(binary)
            .boxed();
        let logical_or = logical_and
            .clone()
            .then(just("||").padded().to(BinaryOp::LogicalOr).then(logical_and).repeated())
            .foldl(binary)
            .boxed();

        logical_or
            .then(
                just('?')
                    .padded()
                    .ignore_then(expr.clone())
                    .then_ignore(just(':').padded())
                    .then(expr)
                    .or_not(),
            )
            .map(|(condition, branches)| match branches {
                Some((when_true, when_false)) => Expression::Conditional {
                    condition: Box::new(condition),
                    when_true: Box::new(when_true),
                    when_false: Box::new(when_false),
                },
                None => condition,
            })
    })
    .then_ignore(end())
}

pub fn parse_expression(text: &str) -> Option<Expression> {
    expression_parser().parse(text.trim()).ok()
}

/// Evaluates a purely numeric expression. Anything with identifiers, unknown
/// digits or arithmetic faults yields `None`.
pub fn evaluate_integer(text: &str) -> Option<i64> {
    parse_expression(text)?.evaluate()
}

impl Expression {
    pub fn evaluate(&self) -> Option<i64> {
        match self {
            Expression::Number(value) => Some(*value),
            Expression::Negate(operand) => operand.evaluate()?.checked_neg(),
            Expression::LogicalNot(operand) => Some((operand.evaluate()? == 0) as i64),
            Expression::BitwiseNot(operand) => Some(!operand.evaluate()?),
            Expression::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                if condition.evaluate()? != 0 {
                    when_true.evaluate()
                } else {
                    when_false.evaluate()
                }
            }
            Expression::Binary { op, left, right } => {
                let l = left.evaluate()?;
                let r = right.evaluate()?;
                apply(*op, l, r)
            }
        }
    }
}

fn apply(op: BinaryOp, l: i64, r: i64) -> Option<i64> {
    let value = match op {
        BinaryOp::LogicalOr => (l != 0 || r != 0) as i64,
        BinaryOp::LogicalAnd => (l != 0 && r != 0) as i64,
        BinaryOp::BitwiseOr => l | r,
        BinaryOp::BitwiseXor => l ^ r,
        BinaryOp::BitwiseAnd => l & r,
        BinaryOp::Equal => (l == r) as i64,
        BinaryOp::NotEqual => (l != r) as i64,
        BinaryOp::LessThan => (l < r) as i64,
        BinaryOp::LessEqual => (l <= r) as i64,
        BinaryOp::GreaterThan => (l > r) as i64,
        BinaryOp::GreaterEqual => (l >= r) as i64,
        BinaryOp::ShiftLeft => l.checked_shl(shift_amount(r)?)?,
        BinaryOp::ShiftRight => l.checked_shr(shift_amount(r)?)?,
        BinaryOp::Add => l.checked_add(r)?,
        BinaryOp::Sub => l.checked_sub(r)?,
        BinaryOp::Mul => l.checked_mul(r)?,
        BinaryOp::Div => l.checked_div(r)?,
        BinaryOp::FloorDiv => {
            let quotient = l.checked_div(r)?;
            if l % r != 0 && ((l < 0) != (r < 0)) {
                quotient - 1
            } else {
                quotient
            }
        }
        BinaryOp::Mod => l.checked_rem(r)?,
        BinaryOp::Power => l.checked_pow(u32::try_from(r).ok()?)?,
    };
    Some(value)
}

fn shift_amount(r: i64) -> Option<u32> {
    u32::try_from(r).ok().filter(|amount| *amount < 64)
}
