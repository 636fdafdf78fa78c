//! Columna derivada `nueva = x <op> y`, con `x` e `y` columnas o literales
//! numéricos y `op` uno de `+ - * /`.
//!
//! Celdas no numéricas y divisiones por cero producen `null`. Entre dos
//! enteros, `+ - *` dan entero; el resto da real.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stepflow_core::{ArtifactMap, Table, TransformError, Transformable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Column(String),
    Number(Value),
}

impl Operand {
    fn parse(s: &str) -> Self {
        if let Ok(i) = s.parse::<i64>() {
            return Operand::Number(Value::from(i));
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => Operand::Number(Value::from(f)),
            _ => Operand::Column(s.to_string()),
        }
    }

    fn value<'a>(&'a self, data: &Table, row: &'a [Value]) -> Result<&'a Value, TransformError> {
        match self {
            Operand::Number(v) => Ok(v),
            Operand::Column(c) => data.column_index(c)
                                      .map(|idx| &row[idx])
                                      .ok_or_else(|| TransformError::MissingColumn(c.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EvalExpr {
    source: String,
    target: String,
    lhs: Operand,
    op: Op,
    rhs: Operand,
}

impl EvalExpr {
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Display for EvalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<EvalExpr> for String {
    fn from(e: EvalExpr) -> Self {
        e.source
    }
}

impl TryFrom<String> for EvalExpr {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for EvalExpr {
    type Err = String;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let (target, expr) = src.split_once('=')
                                .ok_or_else(|| format!("`{src}`: expected `target = expression`"))?;
        let target = target.trim();
        if target.is_empty() || target.contains(char::is_whitespace) {
            return Err(format!("`{src}`: invalid target column `{target}`"));
        }
        let expr = expr.trim();
        // El primer carácter puede ser un signo del literal.
        let split = expr.char_indices()
                        .skip(1)
                        .find(|(_, c)| matches!(c, '+' | '-' | '*' | '/'))
                        .ok_or_else(|| format!("`{src}`: expected an operator"))?;
        let (at, sym) = split;
        let op = match sym {
            '+' => Op::Add,
            '-' => Op::Sub,
            '*' => Op::Mul,
            _ => Op::Div,
        };
        let lhs = expr[..at].trim();
        let rhs = expr[at + 1..].trim();
        if lhs.is_empty() || rhs.is_empty() {
            return Err(format!("`{src}`: missing operand"));
        }
        Ok(Self { source: src.to_string(),
                  target: target.to_string(),
                  lhs: Operand::parse(lhs),
                  op,
                  rhs: Operand::parse(rhs) })
    }
}

fn apply(op: Op, a: &Value, b: &Value) -> Value {
    if let (Some(x), Some(y), true) = (a.as_i64(), b.as_i64(), op != Op::Div) {
        let r = match op {
            Op::Add => x.checked_add(y),
            Op::Sub => x.checked_sub(y),
            _ => x.checked_mul(y),
        };
        if let Some(r) = r {
            return Value::from(r);
        }
    }
    let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
        return Value::Null;
    };
    let r = match op {
        Op::Add => x + y,
        Op::Sub => x - y,
        Op::Mul => x * y,
        Op::Div if y == 0.0 => return Value::Null,
        Op::Div => x / y,
    };
    serde_json::Number::from_f64(r).map(Value::Number).unwrap_or(Value::Null)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleEvalTool {
    pub eval: EvalExpr,
}

impl SimpleEvalTool {
    pub const KIND: &'static str = "simple_eval";

    pub fn new(expr: &str) -> Result<Self, String> {
        Ok(Self { eval: expr.parse()? })
    }
}

impl Transformable for SimpleEvalTool {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn transform(&self, mut data: Table, _other: &ArtifactMap) -> Result<(Table, ArtifactMap), TransformError> {
        let e = &self.eval;
        let values = data.rows
                         .iter()
                         .map(|row| Ok(apply(e.op, e.lhs.value(&data, row)?, e.rhs.value(&data, row)?)))
                         .collect::<Result<Vec<_>, TransformError>>()?;
        if data.is_empty() {
            // Sin filas igual hay que validar columnas y crear la salida.
            for operand in [&e.lhs, &e.rhs] {
                if let Operand::Column(c) = operand {
                    data.require_column(c)?;
                }
            }
        }
        data.set_column(&e.target, values)?;
        Ok((data, ArtifactMap::new()))
    }

    fn box_clone(&self) -> Box<dyn Transformable> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> Table {
        Table::from_rows(vec!["a".into(), "b".into()],
                         vec![vec![json!(1), json!(1)], vec![json!(0), json!(0)], vec![json!(null), json!(2)]]).unwrap()
    }

    fn run(expr: &str) -> Table {
        SimpleEvalTool::new(expr).unwrap().transform(data(), &ArtifactMap::new()).unwrap().0
    }

    #[test]
    fn adds_a_literal() {
        let t = run("c = a + 1");
        assert_eq!(t.column("c").unwrap(), vec![&json!(2), &json!(1), &Value::Null]);
    }

    #[test]
    fn division_yields_reals_and_nulls() {
        let t = run("r = b / a");
        assert_eq!(t.column("r").unwrap(), vec![&json!(1.0), &Value::Null, &Value::Null]);
    }

    #[test]
    fn negative_literal_and_overwrite() {
        let t = run("a = -2 * b");
        assert_eq!(t.column("a").unwrap(), vec![&json!(-2), &json!(0), &json!(-4)]);
        assert_eq!(t.columns.len(), 2);
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!("a + 1".parse::<EvalExpr>().is_err());
        assert!("c = a".parse::<EvalExpr>().is_err());
        assert!("c = a +".parse::<EvalExpr>().is_err());
        assert!(serde_json::from_value::<SimpleEvalTool>(json!({"eval": "x y = 1 + 1"})).is_err());
    }

    #[test]
    fn unknown_column_is_reported() {
        let err = SimpleEvalTool::new("c = zz + 1").unwrap().transform(data(), &ArtifactMap::new()).unwrap_err();
        assert!(matches!(err, TransformError::MissingColumn(c) if c == "zz"));
    }
}
