use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::Args;
use hisab_core::calendar::{self, Calendar};
use hisab_core::filter::{self, FilterCriteria, TypeSelector};
use hisab_core::{FormError, Transaction, TransactionForm, TransactionId, TransactionType};
use hisab_export::ExportKind;
use hisab_storage::{KeyValueStore, StoreError, TransactionStore};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Everything a command needs: loaded config plus the hydrated store.
pub struct AppState<S: KeyValueStore> {
    pub config: Config,
    pub store: TransactionStore<S>,
}

impl<S: KeyValueStore> AppState<S> {
    pub fn new(config: Config, backend: S) -> Self {
        let store = TransactionStore::open(backend);
        if let Some(warning) = store.load_warning() {
            eprintln!("warning: {warning}");
        }
        AppState { config, store }
    }
}

#[derive(Debug, Args)]
pub struct TransactionInput {
    /// Date as YYYY-MM-DD [default: today]
    #[arg(long)]
    pub date: Option<String>,
    /// Calendar the date is written in (bs or ad)
    #[arg(long, default_value = "bs")]
    pub calendar: Calendar,
    /// income or expense
    #[arg(long = "type", default_value = "expense")]
    pub kind: TransactionType,
    /// Income source or expense item
    #[arg(long)]
    pub source: String,
    #[arg(long)]
    pub amount: String,
}

impl TransactionInput {
    fn into_form(self) -> anyhow::Result<TransactionForm> {
        let date = match self.date {
            Some(date) => date,
            None => self.calendar.render(calendar::today())?,
        };
        Ok(TransactionForm {
            date,
            calendar: self.calendar,
            kind: self.kind,
            source: self.source,
            amount: self.amount,
        })
    }
}

/// Fields left out keep their current value.
#[derive(Debug, Default, Args)]
pub struct EditInput {
    #[arg(long)]
    pub date: Option<String>,
    /// Calendar --date is written in [default: bs]
    #[arg(long)]
    pub calendar: Option<Calendar>,
    #[arg(long = "type")]
    pub kind: Option<TransactionType>,
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long)]
    pub amount: Option<String>,
}

#[derive(Debug, Default, Clone, Args)]
pub struct FilterInput {
    /// Earliest date, inclusive
    #[arg(long)]
    pub from: Option<String>,
    /// Latest date, inclusive
    #[arg(long)]
    pub to: Option<String>,
    /// all, income or expense
    #[arg(long = "type", default_value = "all")]
    pub kind: TypeSelector,
    /// Smallest amount, inclusive
    #[arg(long)]
    pub min: Option<String>,
    /// Largest amount, inclusive
    #[arg(long)]
    pub max: Option<String>,
    /// Calendar --from/--to are written in
    #[arg(long = "date-calendar", default_value = "bs")]
    pub calendar: Calendar,
}

impl FilterInput {
    /// Date bounds must be dates in `--date-calendar`; they are stored
    /// zero-padded.
    pub fn criteria(&self) -> anyhow::Result<FilterCriteria> {
        let bound = |value: &Option<String>, flag: &str| -> anyhow::Result<String> {
            match value.as_deref().map(str::trim) {
                None | Some("") => Ok(String::new()),
                Some(date) => self
                    .calendar
                    .normalize(date)
                    .with_context(|| format!("Invalid --{flag} date")),
            }
        };
        Ok(FilterCriteria {
            date_from: bound(&self.from, "from")?,
            date_to: bound(&self.to, "to")?,
            kind: self.kind,
            amount_from: self.min.clone().unwrap_or_default(),
            amount_to: self.max.clone().unwrap_or_default(),
            calendar: self.calendar,
        })
    }
}

fn display_date(date: NaiveDate, cal: Calendar) -> String {
    match cal {
        Calendar::Ad => calendar::format_ad(date),
        Calendar::Bs => match calendar::to_bs(date) {
            Ok(bs) => calendar::format_bs(bs),
            Err(_) => calendar::format_iso(date),
        },
    }
}

fn write_transaction(out: &mut impl Write, tx: &Transaction, cal: Calendar) -> std::io::Result<()> {
    writeln!(
        out,
        "{}  {} ({}: {})  {}{}  {}",
        tx.id,
        display_date(tx.date, cal),
        cal.other(),
        display_date(tx.date, cal.other()),
        tx.kind.sign(),
        tx.amount,
        tx.source
    )
}

fn save_form<S: KeyValueStore>(
    state: &mut AppState<S>,
    form: TransactionForm,
    existing: Option<&TransactionId>,
    out: &mut impl Write,
) -> anyhow::Result<Transaction> {
    let draft = match form.into_draft() {
        Ok(draft) => draft,
        Err(FormError::Invalid(errors)) => {
            for (field, message) in &errors {
                writeln!(out, "{field}: {message}")?;
            }
            bail!("Transaction not saved: {} invalid field(s)", errors.len());
        }
    };
    let tx = match existing {
        Some(id) => state.store.update(id, draft)?,
        None => state.store.add(draft)?,
    };
    Ok(tx)
}

pub fn add<S: KeyValueStore>(
    state: &mut AppState<S>,
    input: TransactionInput,
    out: &mut impl Write,
) -> anyhow::Result<Transaction> {
    let form = input.into_form()?;
    let tx = save_form(state, form, None, out)?;
    writeln!(out, "Added transaction:")?;
    write_transaction(out, &tx, state.config.display_calendar)?;
    Ok(tx)
}

pub fn edit<S: KeyValueStore>(
    state: &mut AppState<S>,
    id: &TransactionId,
    input: EditInput,
    out: &mut impl Write,
) -> anyhow::Result<Transaction> {
    let current = state
        .store
        .get(id)
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;

    let mut form = TransactionForm::from_transaction(current);
    if let Some(cal) = input.calendar {
        form.switch_calendar(cal)?;
    } else if input.date.is_some() {
        form.switch_calendar(Calendar::Bs)?;
    }
    if let Some(date) = input.date {
        form.date = date;
    }
    if let Some(kind) = input.kind {
        form.kind = kind;
    }
    if let Some(source) = input.source {
        form.source = source;
    }
    if let Some(amount) = input.amount {
        form.amount = amount;
    }

    let tx = save_form(state, form, Some(id), out)?;
    writeln!(out, "Updated transaction:")?;
    write_transaction(out, &tx, state.config.display_calendar)?;
    Ok(tx)
}

pub fn delete<S: KeyValueStore>(
    state: &mut AppState<S>,
    id: &TransactionId,
    out: &mut impl Write,
) -> anyhow::Result<Transaction> {
    let removed = state.store.delete(id)?;
    writeln!(out, "Deleted transaction:")?;
    write_transaction(out, &removed, state.config.display_calendar)?;
    Ok(removed)
}

pub fn recent<S: KeyValueStore>(
    state: &AppState<S>,
    limit: Option<usize>,
    show: Option<Calendar>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let cal = show.unwrap_or(state.config.display_calendar);
    let limit = limit.unwrap_or(state.config.recent_limit);

    if state.store.is_empty() {
        writeln!(out, "No transactions yet. Add one with `hisab add`.")?;
        return Ok(());
    }

    for tx in state.store.recent(limit) {
        write_transaction(out, tx, cal)?;
    }
    if state.store.len() > limit {
        writeln!(out, "View all {} transactions with `hisab list`.", state.store.len())?;
    }
    Ok(())
}

pub fn list<S: KeyValueStore>(
    state: &AppState<S>,
    filters: &FilterInput,
    show: Option<Calendar>,
    out: &mut impl Write,
) -> anyhow::Result<Vec<Transaction>> {
    let cal = show.unwrap_or(state.config.display_calendar);
    let criteria = filters.criteria()?;
    let active = criteria.active_count();
    let filtered = filter::apply(state.store.list(), &criteria);

    writeln!(out, "{}", filter::describe_results(filtered.len(), state.store.len(), active))?;
    if filtered.is_empty() {
        if active > 0 {
            writeln!(out, "No transactions match your filters.")?;
        } else {
            writeln!(out, "No transactions found.")?;
        }
    }
    for tx in &filtered {
        write_transaction(out, tx, cal)?;
    }
    Ok(filtered)
}

pub fn summary<S: KeyValueStore>(state: &AppState<S>, out: &mut impl Write) -> anyhow::Result<()> {
    let totals = state.store.totals()?;
    writeln!(out, "Total Income:   {}", totals.income)?;
    writeln!(out, "Total Expenses: {}", totals.expense)?;
    writeln!(out, "Net Balance:    {}", totals.net)?;
    writeln!(out, "Transactions:   {}", totals.count)?;
    Ok(())
}

/// Writes the CSV and returns its path. `output` may be a file or an existing
/// directory; by default the file lands in the working directory.
pub fn export<S: KeyValueStore>(
    state: &AppState<S>,
    filters: Option<&FilterInput>,
    output: Option<PathBuf>,
    today: NaiveDate,
    out: &mut impl Write,
) -> anyhow::Result<PathBuf> {
    let (kind, transactions) = match filters {
        Some(filters) => (
            ExportKind::Filtered,
            filter::apply(state.store.list(), &filters.criteria()?),
        ),
        None => (ExportKind::All, state.store.list().to_vec()),
    };

    if transactions.is_empty() {
        bail!("No transactions to export");
    }

    let file_name = hisab_export::export_file_name(kind, today);
    let path = match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path,
        None => Path::new(".").join(file_name),
    };

    hisab_export::export_to_file(&path, &transactions, kind.columns())
        .with_context(|| format!("Failed to export to {}", path.display()))?;
    writeln!(out, "Exported {} transactions to {}", transactions.len(), path.display())?;
    Ok(path)
}

/// Prints `date` (written in `from`) in the other calendar.
pub fn convert(date: &str, from: Calendar, out: &mut impl Write) -> anyhow::Result<String> {
    let to = from.other();
    let converted = Calendar::convert(date, from, to)?;
    if converted.is_empty() {
        bail!("No date given");
    }
    let stored = from.parse(date)?;
    writeln!(out, "{converted} {to} ({})", display_date(stored, to))?;
    Ok(converted)
}
