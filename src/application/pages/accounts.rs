use std::cell::RefCell;
use std::rc::Rc;

use crate::application::pages::{PageServices, log_surface_error};
use crate::application::polling::{EndpointFetcher, PollingController, StreamBinding, StreamView};
use crate::application::ports::{BusyIndicator, Field, Surface};
use crate::application::render::{ACCOUNT_COLUMNS, account_row, account_row_selector, no_data_row};
use crate::domain::records::{AccountHealth, AccountRecord, lenient_f64};
use crate::domain::stream::ACCOUNT_REFRESH_PERIOD;
use crate::domain::logging::LogComponent;
use crate::domain::{AppError, AppResult, Endpoint, Envelope, StreamKey};
use crate::log_warn;

pub const ACCOUNTS_TBODY: &str = "#accounts-tbody";
pub const ACCOUNT_ROWS: &str = "tr.account-row";
pub const REFRESH_TRIGGER: &str = "#refresh-btn";
pub const TOTAL_ACCOUNTS: &str = "#total-accounts";
pub const TOTAL_BALANCE: &str = "#total-balance";
pub const HEALTHY_ACCOUNTS: &str = "#healthy-accounts";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSummary {
    pub accounts: usize,
    pub total_balance: f64,
    pub healthy: usize,
}

impl AccountSummary {
    pub fn balance_label(&self) -> String {
        format!("{:.2} USDT", self.total_balance)
    }
}

/// Client-side model of the accounts table plus the exchange filter.
#[derive(Debug, Clone, Default)]
pub struct AccountsBoard {
    accounts: Vec<AccountRecord>,
    filter: Option<String>,
}

impl AccountsBoard {
    pub fn new(accounts: Vec<AccountRecord>) -> Self {
        Self { accounts, filter: None }
    }

    pub fn accounts(&self) -> &[AccountRecord] {
        &self.accounts
    }

    pub fn replace(&mut self, accounts: Vec<AccountRecord>) {
        self.accounts = accounts;
    }

    /// An empty exchange clears the filter.
    pub fn set_filter(&mut self, exchange: &str) {
        self.filter = (!exchange.is_empty()).then(|| exchange.to_string());
    }

    pub fn is_visible(&self, account: &AccountRecord) -> bool {
        self.filter.as_deref().is_none_or(|exchange| account.exchange == exchange)
    }

    /// Returns false when no such account is on the board.
    pub fn set_balance(&mut self, exchange: &str, account_id: &str, balance: f64) -> bool {
        match self
            .accounts
            .iter_mut()
            .find(|acc| acc.exchange == exchange && acc.id() == account_id)
        {
            Some(account) => {
                account.balance = Some(balance);
                true
            }
            None => false,
        }
    }

    pub fn summary(&self) -> AccountSummary {
        self.accounts.iter().filter(|acc| self.is_visible(acc)).fold(
            AccountSummary { accounts: 0, total_balance: 0.0, healthy: 0 },
            |mut summary, acc| {
                summary.accounts += 1;
                summary.total_balance += acc.balance_or_zero();
                if acc.health() == AccountHealth::Healthy {
                    summary.healthy += 1;
                }
                summary
            },
        )
    }
}

const ROW_FIELDS: [Field<'static>; 6] = [
    Field::Attribute("data-exchange"),
    Field::Attribute("data-account-id"),
    Field::ChildText(".account-name"),
    Field::ChildAttribute { selector: ".balance-value", name: "data-balance" },
    Field::ChildText(".status-badge"),
    Field::ChildAttribute { selector: ".config-badge", name: "class" },
];

/// Accounts of the rows already in the table. Rows without an exchange are
/// skipped; an unreadable balance counts as zero.
pub fn rendered_accounts(surface: &dyn Surface) -> AppResult<Vec<AccountRecord>> {
    let rows = surface.read_all(ACCOUNT_ROWS, &ROW_FIELDS)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let [exchange, account_id, name, balance, status, config] =
                <[Option<String>; 6]>::try_from(row).ok()?;
            Some(AccountRecord {
                exchange: exchange?,
                account_name: name.unwrap_or_default(),
                account_id,
                balance: balance
                    .and_then(|raw| raw.trim().parse::<f64>().ok())
                    .filter(|value| value.is_finite()),
                status: status.unwrap_or_default(),
                credentials_configured: config
                    .is_some_and(|classes| classes.split_whitespace().any(|c| c == "config-ok")),
            })
        })
        .collect())
}

fn render_summary(surface: &dyn Surface, summary: AccountSummary) -> AppResult<()> {
    surface.set_text(TOTAL_ACCOUNTS, &summary.accounts.to_string())?;
    surface.set_text(TOTAL_BALANCE, &summary.balance_label())?;
    surface.set_text(HEALTHY_ACCOUNTS, &summary.healthy.to_string())
}

struct AccountsView {
    surface: Rc<dyn Surface>,
    board: Rc<RefCell<AccountsBoard>>,
}

impl StreamView for AccountsView {
    fn render(&self, envelope: &Envelope) -> AppResult<()> {
        let accounts: Vec<AccountRecord> = envelope.field_or_default("accounts")?;
        let mut board = self.board.borrow_mut();
        board.replace(accounts);

        let html = if board.accounts().is_empty() {
            no_data_row(ACCOUNT_COLUMNS, "No accounts")
        } else {
            board.accounts().iter().map(|acc| account_row(acc, !board.is_visible(acc))).collect()
        };
        self.surface.set_html(ACCOUNTS_TBODY, &html)?;
        render_summary(self.surface.as_ref(), board.summary())
    }
}

struct BalanceView {
    surface: Rc<dyn Surface>,
    board: Rc<RefCell<AccountsBoard>>,
    exchange: String,
    account_id: String,
}

impl StreamView for BalanceView {
    fn render(&self, envelope: &Envelope) -> AppResult<()> {
        let balance = envelope
            .payload
            .get("balance")
            .map(lenient_f64)
            .transpose()?
            .flatten()
            .ok_or_else(|| AppError::Payload("missing or non-numeric `balance`".into()))?;

        let cell = format!("{} .balance-value", account_row_selector(&self.exchange, &self.account_id));
        self.surface.set_text(&cell, &format!("{balance:.2}"))?;
        self.surface.set_attribute(&cell, "data-balance", &balance.to_string())?;

        let mut board = self.board.borrow_mut();
        if board.set_balance(&self.exchange, &self.account_id, balance) {
            render_summary(self.surface.as_ref(), board.summary())?;
        }
        Ok(())
    }
}

/// Account list with per-row balance refresh and exchange filter.
pub struct AccountsPage {
    services: PageServices,
    controller: Rc<PollingController>,
    board: Rc<RefCell<AccountsBoard>>,
}

impl AccountsPage {
    /// `initial` is the account list handed over by the template. When it is
    /// empty the board is read from the rows already in the table.
    pub fn new(services: PageServices, initial: Vec<AccountRecord>) -> Self {
        let controller = services.controller();
        let accounts = if initial.is_empty() {
            rendered_accounts(services.surface.as_ref()).unwrap_or_else(|err| {
                log_warn!(LogComponent::Application("Accounts"), "reading rendered rows: {}", err);
                Vec::new()
            })
        } else {
            initial
        };
        let board = Rc::new(RefCell::new(AccountsBoard::new(accounts)));

        controller.register(
            StreamKey::Accounts,
            StreamBinding {
                label: "Accounts".into(),
                fetcher: Rc::new(EndpointFetcher::new(Rc::clone(&services.client), Endpoint::AccountsRefresh)),
                view: Rc::new(AccountsView {
                    surface: Rc::clone(&services.surface),
                    board: Rc::clone(&board),
                }),
                busy: BusyIndicator::spinner(REFRESH_TRIGGER),
                success_message: "Accounts refreshed".into(),
            },
        );

        Self { services, controller, board }
    }

    /// Summary of the server-rendered rows, when there are any.
    pub fn start(&self) {
        let board = self.board.borrow();
        if !board.accounts().is_empty() {
            log_surface_error("Accounts", render_summary(self.services.surface.as_ref(), board.summary()));
        }
    }

    pub fn controller(&self) -> &Rc<PollingController> {
        &self.controller
    }

    pub fn summary(&self) -> AccountSummary {
        self.board.borrow().summary()
    }

    pub fn refresh_all(&self) {
        self.controller.spawn_refresh(StreamKey::Accounts);
    }

    pub fn balance_stream(&self, exchange: &str, account_id: &str) -> StreamKey {
        let key = StreamKey::Balance { exchange: exchange.to_string(), account_id: account_id.to_string() };
        if !self.controller.is_registered(&key) {
            let row = account_row_selector(exchange, account_id);
            self.controller.register(
                key.clone(),
                StreamBinding {
                    label: "Balance".into(),
                    fetcher: Rc::new(EndpointFetcher::new(
                        Rc::clone(&self.services.client),
                        Endpoint::Balance { exchange: exchange.to_string(), account_id: account_id.to_string() },
                    )),
                    view: Rc::new(BalanceView {
                        surface: Rc::clone(&self.services.surface),
                        board: Rc::clone(&self.board),
                        exchange: exchange.to_string(),
                        account_id: account_id.to_string(),
                    }),
                    busy: BusyIndicator::Label {
                        trigger: format!("{row} .refresh-single"),
                        busy_text: "Refreshing...".into(),
                        idle_text: "Refresh".into(),
                    },
                    success_message: format!(
                        "{} account {} balance refreshed",
                        exchange.to_uppercase(),
                        account_id
                    ),
                },
            );
        }
        key
    }

    pub fn refresh_single(&self, exchange: &str, account_id: &str) {
        let key = self.balance_stream(exchange, account_id);
        self.controller.spawn_refresh(key);
    }

    pub fn filter_by_exchange(&self, exchange: &str) {
        let mut board = self.board.borrow_mut();
        board.set_filter(exchange);
        let surface = self.services.surface.as_ref();
        for account in board.accounts() {
            log_surface_error(
                "Accounts",
                surface.toggle_class(
                    &account_row_selector(&account.exchange, account.id()),
                    "hidden",
                    !board.is_visible(account),
                ),
            );
        }
        log_surface_error("Accounts", render_summary(surface, board.summary()));
    }

    pub fn set_auto_refresh(&self, enabled: bool) {
        if enabled {
            self.controller.start_auto_refresh(&StreamKey::Accounts, ACCOUNT_REFRESH_PERIOD);
        } else {
            self.controller.stop_auto_refresh(&StreamKey::Accounts);
        }
    }

    pub fn shutdown(&self) {
        self.controller.shutdown();
    }
}
