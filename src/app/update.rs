use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::{Duration, Instant};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ModalState, Screen};
use crate::form::FormEditor;
use crate::ui;

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, mut app: AppState) -> Result<()> {
    app.restore_session();

    loop {
        terminal.draw(|f| {
            ui::render(f, &mut app);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut app, key);
                }
            }
        }

        app.tick(Instant::now());
        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Route one key press by screen and input mode.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }
    match app.screen {
        Screen::Login => handle_login_key(app, key),
        Screen::Dashboard => match app.input_mode {
            InputMode::Normal => handle_normal_key(app, key),
            InputMode::Search => handle_search_key(app, key),
            InputMode::Modal => handle_modal_key(app, key),
        },
    }
}

fn handle_login_key(app: &mut AppState, key: KeyEvent) {
    if app.login.busy {
        return;
    }
    let login = &mut app.login;
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => login.focus = 1 - login.focus.min(1),
        KeyCode::Enter => {
            if login.focus == 0 {
                login.focus = 1;
            } else {
                app.submit_login();
            }
        }
        KeyCode::Backspace => {
            if login.focus == 0 {
                login.username.pop();
            } else {
                login.password.pop();
            }
        }
        KeyCode::Char(c) => {
            if login.focus == 0 {
                login.username.push(c);
            } else {
                login.password.push(c);
            }
            login.error = None;
        }
        _ => {}
    }
}

fn handle_search_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.debouncer.cancel();
            app.apply_search();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.debouncer.cancel();
            app.search_query.clear();
            app.apply_search();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            app.debouncer.touch(Instant::now());
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.debouncer.touch(Instant::now());
        }
        _ => {}
    }
}

fn handle_normal_key(app: &mut AppState, key: KeyEvent) {
    let Some(action) = app.keymap.resolve(&key) else { return };
    match action {
        KeyAction::Quit => app.should_quit = true,
        KeyAction::Ignore => {}
        KeyAction::OpenHelp => app.open_modal(ModalState::Help { scroll: 0 }),
        KeyAction::StartSearch => {
            if app.active_list().is_some() {
                app.input_mode = InputMode::Search;
            }
        }
        KeyAction::NewRecord => app.open_form(false),
        KeyAction::EditSelection => app.open_form(true),
        KeyAction::DeleteSelection => app.request_delete(),
        KeyAction::EnterAction => app.show_details(),
        KeyAction::NextView => app.next_view(),
        KeyAction::PrevView => app.prev_view(),
        KeyAction::MoveUp => {
            if let Some(list) = app.active_list() {
                list.select_prev();
            }
        }
        KeyAction::MoveDown => {
            if let Some(list) = app.active_list() {
                list.select_next();
            }
        }
        KeyAction::PrevPage => {
            if let Some(list) = app.active_list() {
                list.prev_page();
            }
        }
        KeyAction::NextPage => {
            if let Some(list) = app.active_list() {
                list.next_page();
            }
        }
        KeyAction::Reload => app.reload_active(),
        KeyAction::CycleFilter => {
            if let Some(list) = app.active_list() {
                list.cycle_facet();
            }
        }
        KeyAction::ToggleKeybindsPane => app.show_keybinds = !app.show_keybinds,
        KeyAction::ToggleActive => app.request_toggle_active(),
        KeyAction::CancelSelection => app.request_cancel_appointment(),
        KeyAction::AdjustStock => app.open_stock_adjust(),
        KeyAction::CalculateBilling => app.open_billing_lookup(),
        KeyAction::GenerateInvoice => app.open_generate_invoice(),
        KeyAction::SelectPatient => app.select_patient(),
        KeyAction::Logout => app.request_logout(),
    }
}

/// Keys shared by entity forms and dialogs. Returns true when `Enter` was pressed.
fn edit_form(editor: &mut FormEditor, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter => return true,
        KeyCode::Tab | KeyCode::Down => editor.focus_next(),
        KeyCode::BackTab | KeyCode::Up => editor.focus_prev(),
        KeyCode::Left => editor.cycle_choice(false),
        KeyCode::Right => editor.cycle_choice(true),
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Char(c) => editor.input_char(c),
        _ => {}
    }
    false
}

fn handle_modal_key(app: &mut AppState, key: KeyEvent) {
    let Some(modal) = app.modal.as_mut() else {
        app.input_mode = InputMode::Normal;
        return;
    };
    match modal {
        ModalState::EntityForm(view) => {
            let view = *view;
            if key.code == KeyCode::Esc {
                if !app.form_is_submitting(view) {
                    app.close_modal();
                }
                return;
            }
            let submit = match app.forms.editor_mut(view) {
                Some(editor) => edit_form(editor, key),
                None => {
                    app.close_modal();
                    return;
                }
            };
            if submit {
                app.submit_form(view);
            }
        }
        ModalState::Dialog { editor, .. } => {
            if key.code == KeyCode::Esc {
                app.close_modal();
                return;
            }
            if edit_form(editor, key) {
                app.submit_dialog();
            }
        }
        ModalState::Confirm { action, yes } => match key.code {
            KeyCode::Esc | KeyCode::Char('n') => app.close_modal(),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => *yes = !*yes,
            KeyCode::Char('y') => {
                let action = action.clone();
                app.close_modal();
                app.perform(action);
            }
            KeyCode::Enter => {
                let chosen = (*yes).then(|| action.clone());
                app.close_modal();
                if let Some(action) = chosen {
                    app.perform(action);
                }
            }
            _ => {}
        },
        ModalState::Details { scroll, .. } | ModalState::Help { scroll } => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?') => app.close_modal(),
            KeyCode::Up | KeyCode::Char('k') => *scroll = scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => *scroll = scroll.saturating_add(1),
            _ => {}
        },
    }
}
