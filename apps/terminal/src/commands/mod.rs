//! # Commands
//!
//! One typed line in, one rendered answer out.
//!
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (parsing + dispatch)
//! ├── session.rs   ◄─── login, logout, whoami
//! ├── medicine.rs  ◄─── list, search, find, medicine add/delete
//! ├── cart.rs      ◄─── add, qty, set, remove, discount, clear, checkout
//! └── report.rs    ◄─── sales, inventory, profit, expiring
//! ```
//!
//! ## Flow
//! ```text
//! "qty 12 +2" ──► split_args ──► Command::Quantity{12, 2} ──► dispatch
//!                                                               │
//!                                 check_access (unless login) ◄─┘
//!                                                               │
//!                                      cart::quantity(ctx, ..) ◄┘
//!                                                               │
//!                                   Ok(rendered) / Err(ApiError)
//! ```

pub mod cart;
pub mod medicine;
pub mod report;
pub mod session;

use chrono::NaiveDate;
use tracing::debug;

use pharmadesk_client::{AppContext, Transport};
use pharmadesk_core::{CustomerInfo, MedicineId, PaymentMethod};

use crate::error::ApiError;
use crate::render;

#[derive(Debug, Clone, PartialEq)]
pub enum ReportKind {
    Sales(Option<(NaiveDate, NaiveDate)>),
    Inventory,
    Profit(Option<(NaiveDate, NaiveDate)>),
    Expiring(Option<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { email: String, password: String },
    Logout,
    WhoAmI,
    List { search: Option<String> },
    Search { term: String },
    Find { term: String },
    AddMedicine { fields: Vec<(String, String)> },
    DeleteMedicine { id: MedicineId },
    Add { id: MedicineId },
    Quantity { id: MedicineId, delta: i64 },
    SetQuantity { id: MedicineId, quantity: i64 },
    Remove { id: MedicineId },
    Discount { input: String },
    ShowCart,
    ClearCart,
    Checkout {
        payment: PaymentMethod,
        customer: CustomerInfo,
    },
    Report(ReportKind),
    Toasts,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line.
    pub fn parse(line: &str) -> Result<Command, ApiError> {
        let args = split_args(line)?;
        let Some((head, rest)) = args.split_first() else {
            return Err(ApiError::validation("Empty command"));
        };

        let command = match head.to_lowercase().as_str() {
            "login" => match rest {
                [email, password] => Command::Login {
                    email: email.clone(),
                    password: password.clone(),
                },
                _ => return Err(ApiError::usage("login <email> <password>")),
            },
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "list" => Command::List {
                search: (!rest.is_empty()).then(|| rest.join(" ")),
            },
            "search" if !rest.is_empty() => Command::Search {
                term: rest.join(" "),
            },
            "search" => return Err(ApiError::usage("search <term>")),
            "find" => Command::Find {
                term: rest.join(" "),
            },
            "medicine" => match rest.split_first() {
                Some((sub, fields)) if sub == "add" => Command::AddMedicine {
                    fields: key_values(fields)?,
                },
                Some((sub, [id])) if sub == "delete" => Command::DeleteMedicine {
                    id: medicine_id(id)?,
                },
                _ => return Err(ApiError::usage("medicine add key=value... | medicine delete <id>")),
            },
            "add" => match rest {
                [id] => Command::Add { id: medicine_id(id)? },
                _ => return Err(ApiError::usage("add <id>")),
            },
            "qty" => match rest {
                [id, delta] => Command::Quantity {
                    id: medicine_id(id)?,
                    delta: number(delta.trim_start_matches('+'), "quantity change")?,
                },
                _ => return Err(ApiError::usage("qty <id> <+n|-n>")),
            },
            "set" => match rest {
                [id, quantity] => Command::SetQuantity {
                    id: medicine_id(id)?,
                    quantity: number(quantity, "quantity")?,
                },
                _ => return Err(ApiError::usage("set <id> <n>")),
            },
            "remove" | "rm" => match rest {
                [id] => Command::Remove { id: medicine_id(id)? },
                _ => return Err(ApiError::usage("remove <id>")),
            },
            "discount" => Command::Discount {
                input: rest.join(" "),
            },
            "cart" => Command::ShowCart,
            "clear" => Command::ClearCart,
            "checkout" => parse_checkout(rest),
            "report" => Command::Report(parse_report(rest)?),
            "toasts" => Command::Toasts,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(ApiError::validation(format!(
                    "Unknown command '{}'. Type 'help'.",
                    other
                )))
            }
        };
        Ok(command)
    }

    /// Whether the command needs a signed-in user.
    pub fn requires_session(&self) -> bool {
        !matches!(
            self,
            Command::Login { .. } | Command::Help | Command::Quit | Command::Toasts
        )
    }
}

/// Runs a parsed command against the context.
pub async fn dispatch<T: Transport>(ctx: &AppContext<T>, command: Command) -> Result<String, ApiError> {
    debug!(command = ?command, "Dispatching");
    if command.requires_session() && !ctx.auth.check_access() {
        return Err(ApiError::auth_required());
    }

    match command {
        Command::Login { email, password } => session::login(ctx, &email, &password).await,
        Command::Logout => session::logout(ctx).await,
        Command::WhoAmI => session::whoami(ctx),
        Command::List { search } => medicine::list(ctx, search.as_deref()).await,
        Command::Search { term } => medicine::search(ctx, &term).await,
        Command::Find { term } => Ok(medicine::find(ctx, &term)),
        Command::AddMedicine { fields } => medicine::add(ctx, fields).await,
        Command::DeleteMedicine { id } => medicine::delete(ctx, id).await,
        Command::Add { id } => cart::add(ctx, id).await,
        Command::Quantity { id, delta } => cart::quantity(ctx, id, delta),
        Command::SetQuantity { id, quantity } => cart::set(ctx, id, quantity),
        Command::Remove { id } => cart::remove(ctx, id),
        Command::Discount { input } => cart::discount(ctx, &input),
        Command::ShowCart => Ok(cart::show(ctx)),
        Command::ClearCart => cart::clear(ctx).await,
        Command::Checkout { payment, customer } => cart::checkout(ctx, customer, payment).await,
        Command::Report(kind) => report::run(ctx, kind).await,
        Command::Toasts => Ok(toasts(ctx)),
        Command::Help => Ok(render::HELP.to_string()),
        Command::Quit => Ok(String::new()),
    }
}

fn toasts<T: Transport>(ctx: &AppContext<T>) -> String {
    let active = ctx.notifications.active();
    if active.is_empty() {
        return "No notifications".to_string();
    }
    active.iter().map(render::toast).collect::<Vec<_>>().join("\n")
}

// =============================================================================
// Argument Parsing
// =============================================================================

/// Splits on whitespace; double quotes group words.
pub fn split_args(line: &str) -> Result<Vec<String>, ApiError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }

    if quoted {
        return Err(ApiError::validation("Unclosed quote"));
    }
    if pending {
        args.push(current);
    }
    Ok(args)
}

fn key_values(args: &[String]) -> Result<Vec<(String, String)>, ApiError> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.trim().to_lowercase(), v.to_string()))
                .ok_or_else(|| ApiError::validation(format!("Expected key=value, got '{}'", arg)))
        })
        .collect()
}

fn medicine_id(arg: &str) -> Result<MedicineId, ApiError> {
    arg.parse()
        .map_err(|_| ApiError::validation(format!("'{}' is not a medicine id", arg)))
}

fn number(arg: &str, what: &str) -> Result<i64, ApiError> {
    arg.parse()
        .map_err(|_| ApiError::validation(format!("'{}' is not a valid {}", arg, what)))
}

fn date(arg: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(arg, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("'{}' is not a YYYY-MM-DD date", arg)))
}

fn parse_checkout(args: &[String]) -> Command {
    let mut payment = PaymentMethod::default();
    let mut phone = String::new();
    let mut name = Vec::new();

    for (i, arg) in args.iter().enumerate() {
        if i == 0 {
            if let Ok(method) = arg.parse::<PaymentMethod>() {
                payment = method;
                continue;
            }
        }
        match arg.strip_prefix("phone=") {
            Some(number) => phone = number.to_string(),
            None => name.push(arg.as_str()),
        }
    }

    Command::Checkout {
        payment,
        customer: CustomerInfo::new(&name.join(" "), &phone),
    }
}

fn parse_report(args: &[String]) -> Result<ReportKind, ApiError> {
    let range = |rest: &[String]| -> Result<Option<(NaiveDate, NaiveDate)>, ApiError> {
        match rest {
            [] => Ok(None),
            [start, end] => Ok(Some((date(start)?, date(end)?))),
            _ => Err(ApiError::usage("report sales|profit [start end]")),
        }
    };

    match args.split_first() {
        Some((kind, rest)) => match kind.to_lowercase().as_str() {
            "sales" => Ok(ReportKind::Sales(range(rest)?)),
            "profit" => Ok(ReportKind::Profit(range(rest)?)),
            "inventory" => Ok(ReportKind::Inventory),
            "expiring" | "expiry" => match rest {
                [] => Ok(ReportKind::Expiring(None)),
                [days] => Ok(ReportKind::Expiring(Some(number(days, "number of days")?))),
                _ => Err(ApiError::usage("report expiring [days]")),
            },
            _ => Err(ApiError::usage("report sales|inventory|profit|expiring")),
        },
        None => Err(ApiError::usage("report sales|inventory|profit|expiring")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_split_args_with_quotes() {
        assert_eq!(
            split_args(r#"medicine add name="Dolo 650" qty=10"#).unwrap(),
            vec!["medicine", "add", "name=Dolo 650", "qty=10"]
        );
        assert_eq!(split_args("  cart  ").unwrap(), vec!["cart"]);
        assert!(split_args(r#"find "dolo"#).is_err());
    }

    #[test]
    fn test_parse_cart_commands() {
        assert_eq!(Command::parse("add 12").unwrap(), Command::Add { id: MedicineId(12) });
        assert_eq!(
            Command::parse("qty 12 +2").unwrap(),
            Command::Quantity {
                id: MedicineId(12),
                delta: 2
            }
        );
        assert_eq!(
            Command::parse("qty 12 -1").unwrap(),
            Command::Quantity {
                id: MedicineId(12),
                delta: -1
            }
        );
        assert_eq!(
            Command::parse("discount 12.5").unwrap(),
            Command::Discount {
                input: "12.5".to_string()
            }
        );

        let err = Command::parse("add twelve").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_parse_checkout() {
        assert_eq!(
            Command::parse("checkout").unwrap(),
            Command::Checkout {
                payment: PaymentMethod::Cash,
                customer: CustomerInfo::walk_in(),
            }
        );
        assert_eq!(
            Command::parse("checkout upi phone=9876543210 Anil Kumar").unwrap(),
            Command::Checkout {
                payment: PaymentMethod::Upi,
                customer: CustomerInfo::new("Anil Kumar", "9876543210"),
            }
        );
    }

    #[test]
    fn test_parse_reports() {
        assert_eq!(
            Command::parse("report sales 2026-10-01 2026-10-16").unwrap(),
            Command::Report(ReportKind::Sales(Some((
                NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            ))))
        );
        assert_eq!(
            Command::parse("report expiring").unwrap(),
            Command::Report(ReportKind::Expiring(None))
        );
        assert!(Command::parse("report sales 2026-10-01").is_err());
        assert!(Command::parse("report weather").is_err());
    }

    #[test]
    fn test_parse_medicine_commands() {
        assert_eq!(
            Command::parse("medicine delete 7").unwrap(),
            Command::DeleteMedicine { id: MedicineId(7) }
        );
        let Command::AddMedicine { fields } =
            Command::parse(r#"medicine add Name="Zinc 50" qty=5"#).unwrap()
        else {
            panic!("expected AddMedicine");
        };
        assert_eq!(fields[0], ("name".to_string(), "Zinc 50".to_string()));
        assert!(Command::parse("medicine add qty").is_err());
    }

    #[test]
    fn test_session_requirement() {
        assert!(!Command::parse("login a@b.in pw").unwrap().requires_session());
        assert!(!Command::parse("help").unwrap().requires_session());
        assert!(Command::parse("cart").unwrap().requires_session());
        assert!(Command::parse("frobnicate").is_err());
    }
}
