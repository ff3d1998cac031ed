pub mod calendar;
pub mod filter;
pub mod form;
pub mod money;
pub mod summary;
pub mod transaction;

pub use calendar::{BsDate, Calendar, DateError};
pub use filter::{FilterCriteria, TypeSelector};
pub use form::{Field, FormError, TransactionForm, ValidationErrors};
pub use money::{format_currency, Money};
pub use summary::{Totals, TotalsOverflow};
pub use transaction::{Transaction, TransactionDraft, TransactionId, TransactionType};
