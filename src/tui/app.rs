use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;

use crate::api::ApiClient;
use crate::context::AuthContext;
use crate::error::ApiError;
use crate::models::parse_due_date;
use crate::pages::dashboard::DisplayItem;
use crate::pages::{
    self, CreateTaskPage, DashboardPage, LoginPage, ProfilePage, Route, SessionsPage, SignupPage, TaskViewPage,
    UsersListPage,
};

/// The controller behind the current screen.
pub enum Page {
    Home,
    Login(LoginPage),
    Signup(SignupPage),
    Dashboard(DashboardPage),
    CreateTask(CreateTaskPage),
    TaskView(TaskViewPage),
    Profile(ProfilePage),
    Sessions(SessionsPage),
    UsersList(UsersListPage),
}

/// A form field as shown on screen.
pub struct FieldView {
    pub label: &'static str,
    pub value: String,
}

pub struct App {
    pub api: ApiClient,
    pub route: Route,
    pub page: Page,
    pub ctx: Option<AuthContext>,
    /// Selected row on list pages.
    pub state: TableState,
    /// Focused field on form pages.
    pub focus: usize,
    /// Raw due date text; the draft only changes when it parses.
    pub due_input: String,
    pub due_invalid: bool,
    /// Message that survives a navigation, e.g. why we were sent to login.
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    /// Opens the dashboard when a session is stored, the home page otherwise.
    pub async fn new(api: ApiClient) -> App {
        let start = if api.session().get().is_some() { Route::Dashboard } else { Route::Home };
        let mut app = App {
            api,
            route: Route::Home,
            page: Page::Home,
            ctx: None,
            state: TableState::default(),
            focus: 0,
            due_input: String::new(),
            due_invalid: false,
            status: None,
            should_quit: false,
        };
        app.navigate(start).await;
        app
    }

    /// Switches to `route`, resolving the acting user first.
    ///
    /// The old page is dropped together with its state, so nothing it
    /// started can touch the new screen.
    pub async fn navigate(&mut self, route: Route) {
        let mut route = route;
        loop {
            if route.requires_session() {
                match AuthContext::resolve(&self.api).await {
                    Ok(ctx) => self.ctx = Some(ctx),
                    Err(ApiError::Unauthenticated) => {
                        self.ctx = None;
                        self.status = Some("Please log in.".into());
                        route = Route::Login;
                        continue;
                    }
                    Err(e) => {
                        self.status = Some(e.to_string());
                        self.ctx = None;
                        route = Route::Home;
                        continue;
                    }
                }
            } else {
                self.ctx = None;
            }

            if route == Route::UsersList && !self.is_admin() {
                self.status = Some("Only administrators can manage users.".into());
                route = Route::Dashboard;
                continue;
            }
            break;
        }

        self.page = self.build_page(&route).await;
        self.route = route;
        self.focus = 0;
        self.due_input = self.initial_due_input();
        self.due_invalid = false;
        self.state = TableState::default();
        if self.row_count() > 0 {
            self.state.select(Some(0));
        }
    }

    pub fn is_admin(&self) -> bool {
        self.ctx.as_ref().map(|c| c.is_admin).unwrap_or(false)
    }

    async fn build_page(&self, route: &Route) -> Page {
        let api = &self.api;
        match (route, self.ctx.as_ref()) {
            (Route::Home, _) => Page::Home,
            (Route::Login, _) => Page::Login(LoginPage::new()),
            (Route::Signup, _) => Page::Signup(SignupPage::new()),
            (Route::CreateTask, _) => Page::CreateTask(CreateTaskPage::new()),
            (Route::Task(id), _) => {
                let mut page = TaskViewPage::new(*id);
                page.load(api).await;
                Page::TaskView(page)
            }
            (Route::Dashboard, Some(ctx)) => {
                let mut page = DashboardPage::new(ctx);
                page.load(api).await;
                Page::Dashboard(page)
            }
            (Route::Profile(id), Some(ctx)) => {
                let mut page = ProfilePage::new(id.clone(), ctx);
                page.load(api).await;
                Page::Profile(page)
            }
            (Route::Sessions, Some(ctx)) => {
                let mut page = SessionsPage::new(ctx);
                page.load(api).await;
                Page::Sessions(page)
            }
            (Route::UsersList, Some(ctx)) => {
                let mut page = UsersListPage::new(ctx);
                page.load(api).await;
                Page::UsersList(page)
            }
            (_, None) => Page::Home,
        }
    }

    fn initial_due_input(&self) -> String {
        match &self.page {
            Page::TaskView(p) => p.form.draft().due_date.map(|d| d.to_string()).unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Number of selectable rows on list pages.
    pub fn row_count(&self) -> usize {
        match &self.page {
            Page::Dashboard(p) => p.display_items().len(),
            Page::Sessions(p) => p.sessions.len(),
            Page::UsersList(p) => p.users.len(),
            _ => 0,
        }
    }

    /// Selects the next row, wrapping around.
    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 { return; }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous row, wrapping around.
    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 { return; }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn clamp_selection(&mut self) {
        let len = self.row_count();
        if len == 0 {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= len {
                self.state.select(Some(len - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    fn selected_task_id(&self) -> Option<i64> {
        let Page::Dashboard(p) = &self.page else { return None };
        match p.display_items().into_iter().nth(self.state.selected()?)? {
            DisplayItem::Task(t) => Some(t.id),
            DisplayItem::OwnerHeader(..) => None,
        }
    }

    fn selected_user_id(&self) -> Option<i64> {
        let Page::UsersList(p) = &self.page else { return None };
        p.users.get(self.state.selected()?).map(|u| u.id)
    }

    /// Fields of the current form, in focus order.
    pub fn form_fields(&self) -> Vec<FieldView> {
        let mask = |s: &str| "*".repeat(s.chars().count());
        match &self.page {
            Page::Login(p) => vec![
                FieldView { label: "Email", value: p.email.clone() },
                FieldView { label: "Password", value: mask(&p.password) },
            ],
            Page::Signup(p) => vec![
                FieldView { label: "Name", value: p.name.clone() },
                FieldView { label: "Email", value: p.email.clone() },
                FieldView { label: "Password", value: mask(&p.password) },
            ],
            Page::CreateTask(p) => vec![
                FieldView { label: "Title", value: p.form.draft().title.clone() },
                FieldView { label: "Description", value: p.form.draft().description.clone() },
                FieldView { label: "Due (YYYY-MM-DD)", value: self.due_input.clone() },
            ],
            Page::TaskView(p) => vec![
                FieldView { label: "Title", value: p.form.draft().title.clone() },
                FieldView { label: "Description", value: p.form.draft().description.clone() },
                FieldView { label: "Due (YYYY-MM-DD)", value: self.due_input.clone() },
                FieldView {
                    label: "Completed",
                    value: if p.form.draft().completed { "[x]".into() } else { "[ ]".into() },
                },
            ],
            Page::Profile(p) => vec![
                FieldView { label: "Name", value: p.form.draft().name.clone() },
                FieldView { label: "Email", value: p.form.draft().email.clone() },
                FieldView { label: "New password", value: mask(&p.form.draft().password) },
            ],
            _ => Vec::new(),
        }
    }

    /// Whether the submit control of the current form is enabled.
    pub fn can_submit(&self) -> bool {
        match &self.page {
            Page::Login(_) | Page::Signup(_) => true,
            Page::CreateTask(p) => p.form.can_submit() && !self.due_invalid,
            Page::TaskView(p) => p.form.can_submit() && !self.due_invalid,
            Page::Profile(p) => p.form.can_submit(),
            _ => false,
        }
    }

    pub fn confirm_pending(&self) -> bool {
        match &self.page {
            Page::TaskView(p) => p.confirm.is_pending(),
            Page::Profile(p) => p.confirm.is_pending(),
            _ => false,
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if self.confirm_pending() {
            self.handle_confirm_key(key).await;
            return;
        }
        match self.page {
            Page::Home => self.handle_home_key(key).await,
            Page::Dashboard(_) => self.handle_dashboard_key(key).await,
            Page::Sessions(_) => self.handle_sessions_key(key).await,
            Page::UsersList(_) => self.handle_users_key(key).await,
            _ => self.handle_form_key(key).await,
        }
    }

    async fn handle_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('l') => self.navigate(Route::Login).await,
            KeyCode::Char('s') => self.navigate(Route::Signup).await,
            _ => {}
        }
    }

    /// Shortcuts shared by the pages behind login.
    async fn handle_menu_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('p') => {
                if let Some(id) = self.ctx.as_ref().map(|c| c.user_id.clone()) {
                    self.navigate(Route::Profile(id)).await;
                }
            }
            KeyCode::Char('s') => self.navigate(Route::Sessions).await,
            KeyCode::Char('u') if self.is_admin() => self.navigate(Route::UsersList).await,
            KeyCode::Char('L') => self.logout().await,
            _ => return false,
        }
        true
    }

    async fn handle_dashboard_key(&mut self, key: KeyEvent) {
        if self.handle_menu_key(key).await {
            return;
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Char('a') => self.navigate(Route::CreateTask).await,
            KeyCode::Enter => {
                if let Some(id) = self.selected_task_id() {
                    self.navigate(Route::Task(id)).await;
                }
            }
            KeyCode::Char(' ') => {
                if let Some(id) = self.selected_task_id() {
                    if let Page::Dashboard(p) = &mut self.page {
                        p.toggle_completion(id, &self.api).await;
                    }
                }
            }
            KeyCode::Char('f') => {
                if let Page::Dashboard(p) = &mut self.page {
                    let next = p.next_filter();
                    p.set_filter(next, &self.api).await;
                }
                self.clamp_selection();
            }
            KeyCode::Char('r') => {
                if let Page::Dashboard(p) = &mut self.page {
                    p.load(&self.api).await;
                }
                self.clamp_selection();
            }
            _ => {}
        }
    }

    async fn handle_sessions_key(&mut self, key: KeyEvent) {
        if self.handle_menu_key(key).await {
            return;
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Char('r') => {
                if let Page::Sessions(p) = &mut self.page {
                    p.load(&self.api).await;
                }
                self.clamp_selection();
            }
            KeyCode::Esc => self.navigate(Route::Dashboard).await,
            _ => {}
        }
    }

    async fn handle_users_key(&mut self, key: KeyEvent) {
        if self.handle_menu_key(key).await {
            return;
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Char('P') => {
                if let Some(id) = self.selected_user_id() {
                    if let Page::UsersList(p) = &mut self.page {
                        p.promote(id, &self.api).await;
                    }
                }
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(id) = self.selected_user_id() {
                    let route = match &self.page {
                        Page::UsersList(p) => p.edit_route(id),
                        _ => return,
                    };
                    self.navigate(route).await;
                }
            }
            KeyCode::Esc => self.navigate(Route::Dashboard).await,
            _ => {}
        }
    }

    async fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let next = match &mut self.page {
                    Page::TaskView(p) => p.confirm_delete(&self.api).await,
                    Page::Profile(p) => p.confirm_delete(&self.api).await,
                    _ => None,
                };
                if let Some(route) = next {
                    self.navigate(route).await;
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => match &mut self.page {
                Page::TaskView(p) => p.confirm.cancel(),
                Page::Profile(p) => p.confirm.cancel(),
                _ => {}
            },
            _ => {}
        }
    }

    async fn handle_form_key(&mut self, key: KeyEvent) {
        let fields = self.form_fields().len();
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('d') {
                match &mut self.page {
                    Page::TaskView(p) => p.confirm.request(),
                    Page::Profile(p) => p.confirm.request(),
                    _ => {}
                }
            }
            return;
        }
        match key.code {
            KeyCode::Esc => {
                let back = self.back_route();
                self.navigate(back).await;
            }
            KeyCode::Tab | KeyCode::Down => {
                if fields > 0 {
                    self.focus = (self.focus + 1) % fields;
                }
            }
            KeyCode::BackTab | KeyCode::Up => {
                if fields > 0 {
                    self.focus = (self.focus + fields - 1) % fields;
                }
            }
            KeyCode::Enter => self.submit().await,
            KeyCode::Backspace => self.edit_focused(|s| { s.pop(); }),
            KeyCode::Char(c) => self.edit_focused(|s| s.push(c)),
            _ => {}
        }
    }

    /// Where Esc leads from a form page.
    fn back_route(&self) -> Route {
        match &self.page {
            Page::Login(_) | Page::Signup(_) => Route::Home,
            Page::Profile(p) if !p.is_self() => Route::UsersList,
            _ => Route::Dashboard,
        }
    }

    /// Applies a text edit to the focused field.
    fn edit_focused(&mut self, op: impl FnOnce(&mut String)) {
        let focus = self.focus;
        let mut due_changed = false;
        match &mut self.page {
            Page::Login(p) => match focus {
                0 => op(&mut p.email),
                _ => op(&mut p.password),
            },
            Page::Signup(p) => match focus {
                0 => op(&mut p.name),
                1 => op(&mut p.email),
                _ => op(&mut p.password),
            },
            Page::CreateTask(p) => match focus {
                0 => p.form.edit(|d| op(&mut d.title)),
                1 => p.form.edit(|d| op(&mut d.description)),
                _ => {
                    op(&mut self.due_input);
                    due_changed = true;
                }
            },
            Page::TaskView(p) => match focus {
                0 => p.form.edit(|d| op(&mut d.title)),
                1 => p.form.edit(|d| op(&mut d.description)),
                2 => {
                    op(&mut self.due_input);
                    due_changed = true;
                }
                // Any key on the checkbox flips it.
                _ => p.form.edit(|d| d.completed = !d.completed),
            },
            Page::Profile(p) => match focus {
                0 => p.form.edit(|d| op(&mut d.name)),
                1 => p.form.edit(|d| op(&mut d.email)),
                _ => p.form.edit(|d| op(&mut d.password)),
            },
            _ => {}
        }
        if due_changed {
            self.sync_due_date();
        }
    }

    fn sync_due_date(&mut self) {
        match parse_due_date(&self.due_input) {
            Ok(date) => {
                self.due_invalid = false;
                match &mut self.page {
                    Page::CreateTask(p) => p.form.edit(|d| d.due_date = date),
                    Page::TaskView(p) => p.form.edit(|d| d.due_date = date),
                    _ => {}
                }
            }
            Err(_) => self.due_invalid = true,
        }
    }

    async fn submit(&mut self) {
        if self.due_invalid {
            self.status = Some("Due date must be YYYY-MM-DD.".into());
            return;
        }
        let next = match &mut self.page {
            Page::Login(p) => p.submit(&self.api).await,
            Page::Signup(p) => p.submit(&self.api).await,
            Page::CreateTask(p) => p.submit(&self.api).await,
            Page::TaskView(p) => {
                p.save(&self.api).await;
                None
            }
            Page::Profile(p) => {
                p.save(&self.api).await;
                None
            }
            _ => None,
        };
        if let Some(route) = next {
            self.status = None;
            self.navigate(route).await;
        }
    }

    async fn logout(&mut self) {
        let (route, error) = pages::logout(&self.api).await;
        self.navigate(route).await;
        self.status = error.map(|e| format!("Logged out locally; server said: {}", e));
    }

    /// Page-local message, falling back to the navigation status.
    pub fn message(&self) -> Option<&str> {
        let local = match &self.page {
            Page::Home => None,
            Page::Login(p) => p.message.as_deref(),
            Page::Signup(p) => p.message.as_deref(),
            Page::Dashboard(p) => p.message.as_deref(),
            Page::CreateTask(p) => p.error.as_deref(),
            Page::TaskView(p) => p.message.as_deref(),
            Page::Profile(p) => p.message.as_deref(),
            Page::Sessions(p) => p.message.as_deref(),
            Page::UsersList(p) => p.message.as_deref(),
        };
        local.or(self.status.as_deref())
    }
}
