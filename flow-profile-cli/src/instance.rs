//! Reader for the line-based instance format.
//!
//! ```text
//! % comment
//! resource <initial> <lower_limit> <upper_limit>
//! produce <name> <earliest> <latest> <quantity_lower> <quantity_upper>
//! consume <name> <earliest> <latest> <quantity_lower> <quantity_upper>
//! precede <before> <after>
//! ```
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::str::FromStr;

use flow_profile_core::containers::HashMap;
use flow_profile_core::containers::KeyGenerator;
use flow_profile_core::containers::KeyedVec;
use flow_profile_core::profile::Precedence;
use flow_profile_core::profile::QuantityBounds;
use flow_profile_core::profile::ResourceLimits;
use flow_profile_core::profile::TimeBounds;
use flow_profile_core::profile::Transaction;
use flow_profile_core::profile::TransactionId;
use flow_profile_core::profile::TransactionKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum InstanceError {
    #[error("failed to read the instance")]
    Io(#[from] std::io::Error),

    #[error("line {line}: unknown directive '{directive}'")]
    UnknownDirective { line: usize, directive: String },

    #[error("line {line}: '{directive}' takes {expected} arguments, but {found} were given")]
    ArgumentCount {
        line: usize,
        directive: String,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: '{value}' is not a valid number")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: transaction '{name}' is declared twice")]
    DuplicateName { line: usize, name: String },

    #[error("line {line}: unknown transaction '{name}'")]
    UnknownTransaction { line: usize, name: String },

    #[error("line {line}: the resource is declared twice")]
    DuplicateResource { line: usize },

    #[error("the instance does not declare a resource")]
    MissingResource,
}

#[derive(Debug)]
pub(crate) struct Instance {
    pub(crate) limits: ResourceLimits,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) precedences: Vec<Precedence>,
    names: KeyedVec<TransactionId, String>,
}

impl Instance {
    /// The name under which the transaction was declared.
    pub(crate) fn name(&self, id: TransactionId) -> &str {
        self.names.get(id).map(String::as_str).unwrap_or("?")
    }
}

pub(crate) fn parse_instance(source: impl Read) -> Result<Instance, InstanceError> {
    let reader = BufReader::new(source);

    let mut limits = None;
    let mut transactions = vec![];
    let mut ids = KeyGenerator::<TransactionId>::default();
    let mut names = KeyedVec::default();
    let mut by_name: HashMap<String, TransactionId> = HashMap::default();
    let mut unresolved = vec![];

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line?;
        let content = line.split('%').next().unwrap_or_default();
        let tokens = content.split_whitespace().collect::<Vec<_>>();
        let Some((&directive, arguments)) = tokens.split_first() else {
            continue;
        };

        match directive {
            "resource" => {
                expect_arguments(line_number, directive, arguments, 3)?;
                if limits.is_some() {
                    return Err(InstanceError::DuplicateResource { line: line_number });
                }
                limits = Some(ResourceLimits::new(
                    parse_number(line_number, arguments[0])?,
                    parse_number(line_number, arguments[1])?,
                    parse_number(line_number, arguments[2])?,
                ));
            }
            "produce" | "consume" => {
                expect_arguments(line_number, directive, arguments, 5)?;
                let name = arguments[0];
                if by_name.contains_key(name) {
                    return Err(InstanceError::DuplicateName {
                        line: line_number,
                        name: name.to_owned(),
                    });
                }

                let id = ids.next_key();
                let key = names.push(name.to_owned());
                debug_assert_eq!(key, id);
                let _ = by_name.insert(name.to_owned(), id);
                transactions.push(Transaction {
                    id,
                    kind: if directive == "produce" {
                        TransactionKind::Production
                    } else {
                        TransactionKind::Consumption
                    },
                    time: TimeBounds::new(
                        parse_number(line_number, arguments[1])?,
                        parse_number(line_number, arguments[2])?,
                    ),
                    quantity: QuantityBounds::new(
                        parse_number(line_number, arguments[3])?,
                        parse_number(line_number, arguments[4])?,
                    ),
                });
            }
            "precede" => {
                expect_arguments(line_number, directive, arguments, 2)?;
                unresolved.push((line_number, arguments[0].to_owned(), arguments[1].to_owned()));
            }
            _ => {
                return Err(InstanceError::UnknownDirective {
                    line: line_number,
                    directive: directive.to_owned(),
                })
            }
        }
    }

    let resolve = |line: usize, name: String| {
        by_name
            .get(&name)
            .copied()
            .ok_or(InstanceError::UnknownTransaction { line, name })
    };
    let precedences = unresolved
        .into_iter()
        .map(|(line, before, after)| {
            Ok(Precedence::new(resolve(line, before)?, resolve(line, after)?))
        })
        .collect::<Result<Vec<_>, InstanceError>>()?;

    Ok(Instance {
        limits: limits.ok_or(InstanceError::MissingResource)?,
        transactions,
        precedences,
        names,
    })
}

fn expect_arguments(
    line: usize,
    directive: &str,
    arguments: &[&str],
    expected: usize,
) -> Result<(), InstanceError> {
    if arguments.len() != expected {
        return Err(InstanceError::ArgumentCount {
            line,
            directive: directive.to_owned(),
            expected,
            found: arguments.len(),
        });
    }
    Ok(())
}

fn parse_number<Number: FromStr>(line: usize, value: &str) -> Result<Number, InstanceError> {
    value.parse().map_err(|_| InstanceError::InvalidNumber {
        line,
        value: value.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_is_parsed() {
        let source = "\
% a tank which is filled before it is drained
resource 1 0 inf

produce fill 0 5 2 3   % pump
consume drain 2 8 4 4
precede fill drain
";

        let instance = parse_instance(source.as_bytes()).unwrap();

        assert_eq!(instance.limits, ResourceLimits::new(1.0, 0.0, f64::INFINITY));
        assert_eq!(instance.transactions.len(), 2);
        let drain = instance.transactions[1];
        assert_eq!(instance.name(drain.id), "drain");
        assert_eq!(drain.kind, TransactionKind::Consumption);
        assert_eq!(drain.time, TimeBounds::new(2, 8));
        assert_eq!(drain.quantity, QuantityBounds::fixed(4.0));
        assert_eq!(
            instance.precedences,
            vec![Precedence::new(instance.transactions[0].id, drain.id)]
        );
    }

    #[test]
    fn precedences_may_refer_forward() {
        let source = "resource 0 0 1\nprecede a b\nproduce a 0 1 1 1\nconsume b 0 1 1 1\n";

        let instance = parse_instance(source.as_bytes()).unwrap();

        assert_eq!(instance.precedences.len(), 1);
    }

    #[test]
    fn unknown_transaction_is_reported_with_its_line() {
        let source = "resource 0 0 1\nproduce a 0 1 1 1\nprecede a b\n";

        assert!(matches!(
            parse_instance(source.as_bytes()),
            Err(InstanceError::UnknownTransaction { line: 3, .. })
        ));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(matches!(
            parse_instance("resource 0 0\n".as_bytes()),
            Err(InstanceError::ArgumentCount {
                expected: 3,
                found: 2,
                ..
            })
        ));
        assert!(matches!(
            parse_instance("resource 0 0 x\n".as_bytes()),
            Err(InstanceError::InvalidNumber { line: 1, .. })
        ));
        assert!(matches!(
            parse_instance("resource 0 0 1\nborrow a 0 1 1 1\n".as_bytes()),
            Err(InstanceError::UnknownDirective { line: 2, .. })
        ));
        assert!(matches!(
            parse_instance("produce a 0 1 1 1\n".as_bytes()),
            Err(InstanceError::MissingResource)
        ));
        assert!(matches!(
            parse_instance("resource 0 0 1\nproduce a 0 1 1 1\nconsume a 0 1 1 1\n".as_bytes()),
            Err(InstanceError::DuplicateName { line: 3, .. })
        ));
    }
}
