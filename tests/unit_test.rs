// Unit tests for clinic-tui
// These tests work with the public API without a terminal or a backend

#[cfg(test)]
mod list_tests {
    use clinic_tui::list::ListController;
    use clinic_tui::model::Patient;

    fn patients(n: usize) -> Vec<Patient> {
        (0..n)
            .map(|i| {
                let name = if i % 3 == 0 { format!("Ana Perez {i}") } else { format!("Luis Gomez {i}") };
                serde_json::from_value(serde_json::json!({
                    "cedula": format!("{}", 30000000 + i),
                    "fullName": name,
                }))
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_first_page_holds_page_size_items() {
        let mut list = ListController::new(10);
        list.set_items(patients(25));
        assert_eq!(list.total(), 25);
        assert_eq!(list.total_pages(), 3);
        assert_eq!(list.page(), 1);
        assert_eq!(list.page_items().len(), 10);
    }

    #[test]
    fn test_search_resets_to_first_page() {
        let mut list = ListController::new(10);
        list.set_items(patients(25));
        list.next_page();
        assert_eq!(list.page(), 2);

        list.set_search_term("an");
        assert_eq!(list.page(), 1);
        assert_eq!(list.filtered_len(), 9);
        assert!(list.page_items().iter().all(|p| p.full_name.starts_with("Ana")));
    }

    #[test]
    fn test_last_page_is_partial() {
        let mut list = ListController::new(10);
        list.set_items(patients(25));
        list.next_page();
        list.next_page();
        list.next_page();
        assert_eq!(list.page(), 3);
        assert_eq!(list.page_items().len(), 5);
    }

    #[test]
    fn test_search_matches_cedula() {
        let mut list = ListController::new(10);
        list.set_items(patients(25));
        list.set_search_term("30000024");
        assert_eq!(list.filtered_len(), 1);
        assert_eq!(list.selected_item().map(|p| p.cedula.as_str()), Some("30000024"));
    }
}

#[cfg(test)]
mod validation_tests {
    use clinic_tui::validation::{
        is_strong_password, is_valid_cedula, is_valid_email, is_valid_phone, normalize_cedula, parse_date,
    };

    #[test]
    fn test_cedula_accepts_separators() {
        assert!(is_valid_cedula("12345678"));
        assert_eq!(normalize_cedula("12.345.678").as_deref(), Some("12345678"));
        assert!(!is_valid_cedula("1234567"));
        assert!(!is_valid_cedula("12ab5678"));
    }

    #[test]
    fn test_phone_email_password() {
        assert!(is_valid_phone("300 123 4567"));
        assert!(!is_valid_phone("12345"));
        assert!(is_valid_email("ana@mail.co"));
        assert!(!is_valid_email("ana@mail"));
        assert!(is_strong_password("Secret1!"));
        assert!(!is_strong_password("secret11"));
    }

    #[test]
    fn test_both_date_formats() {
        assert_eq!(parse_date("1990-04-01"), parse_date("01/04/1990"));
        assert!(parse_date("1990-13-01").is_none());
    }
}

#[cfg(test)]
mod notification_tests {
    use std::time::{Duration, Instant};

    use clinic_tui::notify::{Lifetime, NotificationCenter, Severity};

    #[test]
    fn test_errors_outlive_successes() {
        let mut center = NotificationCenter::default();
        let now = Instant::now();
        center.show_at(now, "saved", Severity::Success, Lifetime::Default);
        center.show_at(now, "failed", Severity::Error, Lifetime::Default);

        center.prune(now + Duration::from_millis(5500));
        let left: Vec<_> = center.visible().iter().map(|n| n.message.as_str()).collect();
        assert_eq!(left, vec!["failed"]);
    }

    #[test]
    fn test_persistent_and_manual_removal() {
        let mut center = NotificationCenter::default();
        let now = Instant::now();
        let id = center.show_at(now, "sticky", Severity::Info, Lifetime::Persistent);
        assert_eq!(center.prune(now + Duration::from_secs(3600)), 0);
        assert!(center.remove(id));
        assert!(!center.remove(id));
        assert!(center.is_empty());
    }
}

#[cfg(test)]
mod config_tests {
    use clinic_tui::app::keymap::{KeyAction, Keymap};
    use clinic_tui::config::Config;
    use clinic_tui::model::RoleNaming;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic.conf");
        let mut cfg = Config::default();
        cfg.api_base_url = "http://clinic.local:9000/api".into();
        cfg.page_size = 25;
        cfg.role_names = RoleNaming::Spanish;
        cfg.write_file(&path).unwrap();

        let back = Config::from_file(&path).unwrap();
        assert_eq!(back.api_base_url, "http://clinic.local:9000/api");
        assert_eq!(back.page_size, 25);
        assert_eq!(back.role_names, RoleNaming::Spanish);
    }

    #[test]
    fn test_config_ignores_bad_values() {
        let cfg = Config::parse("page_size = 0\ndebounce_ms = soon\nrole_names = klingon\n");
        let def = Config::default();
        assert_eq!(cfg.page_size, def.page_size);
        assert_eq!(cfg.debounce_ms, def.debounce_ms);
        assert_eq!(cfg.role_names, RoleNaming::English);
    }

    #[test]
    fn test_keymap_override() {
        let km = Keymap::parse("Quit = x\nLogout = Ctrl+l\n");
        let x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        let ctrl_l = KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL);
        assert_eq!(km.resolve(&x), Some(KeyAction::Quit));
        assert_eq!(km.resolve(&ctrl_l), Some(KeyAction::Logout));
        // defaults stay in place
        let slash = KeyEvent::new(KeyCode::Char('/'), KeyModifiers::NONE);
        assert_eq!(km.resolve(&slash), Some(KeyAction::StartSearch));
    }
}

#[cfg(test)]
mod app_tests {
    use std::time::{Duration, Instant};

    use clinic_tui::api::ApiClient;
    use clinic_tui::app::keymap::Keymap;
    use clinic_tui::app::tasks::ApiEvent;
    use clinic_tui::app::update::handle_key;
    use clinic_tui::app::{AppState, InputMode, ModalState, Screen, Theme};
    use clinic_tui::auth::AuthService;
    use clinic_tui::config::Config;
    use clinic_tui::model::{Patient, RoleNaming};
    use clinic_tui::nav::{Navigator, View};
    use clinic_tui::notify::Severity;
    use clinic_tui::session::{Session, SessionStore};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            handle_key(app, key(KeyCode::Char(c)));
        }
    }

    // Nothing listens on port 9; no test here waits for a response.
    fn app(rt: &tokio::runtime::Runtime, dir: &std::path::Path) -> AppState {
        let api = ApiClient::new("http://127.0.0.1:9/api", Duration::from_secs(1)).unwrap();
        let auth = AuthService::new(api, SessionStore::new(dir.join("session.json")));
        AppState::new(Config::default(), Theme::mocha(), Keymap::default(), auth, rt.handle().clone())
    }

    fn signed_in_as(app: &mut AppState, role: &str) {
        let user = serde_json::from_value(serde_json::json!({
            "cedula": "10000001", "username": "ana", "role": role
        }))
        .unwrap();
        app.session = Some(Session {
            auth_token: "t".into(),
            current_user: user,
        });
        let role = app.role().unwrap();
        app.navigator = Some(Navigator::for_role(role));
        app.screen = Screen::Dashboard;
        let patients: Vec<Patient> = (0..25)
            .map(|i| {
                let name = if i % 3 == 0 { format!("Ana Perez {i}") } else { format!("Luis Gomez {i}") };
                serde_json::from_value(serde_json::json!({"cedula": format!("{}", 30000000 + i), "fullName": name}))
                    .unwrap()
            })
            .collect();
        app.lists.patients.set_items(patients);
    }

    #[test]
    fn test_login_typing_and_focus() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path());

        type_text(&mut app, "ana");
        handle_key(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "pw");
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.login.username, "ana");
        assert_eq!(app.login.password, "p");
        assert_eq!(app.login.focus, 1);
    }

    #[test]
    fn test_empty_login_is_rejected_locally() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path());

        app.submit_login();
        assert!(!app.login.busy);
        assert!(app.login.error.is_some());
        assert_eq!(app.screen, Screen::Login);
    }

    #[test]
    fn test_search_waits_for_debounce() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path());
        signed_in_as(&mut app, "ADMINISTRATIVE_STAFF");
        assert_eq!(app.active_view(), Some(View::Patients));

        handle_key(&mut app, key(KeyCode::Char('/')));
        assert_eq!(app.input_mode, InputMode::Search);
        type_text(&mut app, "an");
        assert_eq!(app.search_query, "an");
        assert_eq!(app.lists.patients.filtered_len(), 25);

        app.tick(Instant::now() + Duration::from_millis(400));
        assert_eq!(app.lists.patients.filtered_len(), 9);
        assert_eq!(app.lists.patients.page(), 1);
    }

    #[test]
    fn test_enter_applies_search_at_once_and_esc_clears() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path());
        signed_in_as(&mut app, "ADMINISTRATIVE_STAFF");

        handle_key(&mut app, key(KeyCode::Char('/')));
        type_text(&mut app, "luis");
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.lists.patients.filtered_len(), 16);

        handle_key(&mut app, key(KeyCode::Char('/')));
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(app.search_query.is_empty());
        assert_eq!(app.lists.patients.filtered_len(), 25);
    }

    #[test]
    fn test_delete_asks_for_confirmation() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path());
        signed_in_as(&mut app, "ADMINISTRATIVE_STAFF");

        handle_key(&mut app, key(KeyCode::Char('d')));
        assert!(matches!(app.modal, Some(ModalState::Confirm { yes: false, .. })));
        assert_eq!(app.input_mode, InputMode::Modal);

        handle_key(&mut app, key(KeyCode::Char('n')));
        assert!(app.modal.is_none());
        assert_eq!(app.lists.patients.total(), 25);
    }

    #[test]
    fn test_read_only_role_cannot_delete() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path());
        signed_in_as(&mut app, "MEDICO");
        assert_eq!(app.active_view(), Some(View::Patients));

        handle_key(&mut app, key(KeyCode::Char('d')));
        assert!(app.modal.is_none());
        assert_eq!(app.notifications.visible().last().map(|n| n.severity), Some(Severity::Warning));
    }

    #[test]
    fn test_new_record_opens_form_modal() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path());
        signed_in_as(&mut app, "ADMINISTRATIVE_STAFF");

        handle_key(&mut app, key(KeyCode::Char('n')));
        assert!(matches!(app.modal, Some(ModalState::EntityForm(View::Patients))));
        assert!(app.forms.patients.is_open());

        handle_key(&mut app, key(KeyCode::Esc));
        assert!(app.modal.is_none());
        assert!(!app.forms.patients.is_open());
    }

    #[test]
    fn test_help_overlay_and_quit() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path());
        signed_in_as(&mut app, "ENFERMERA");

        handle_key(&mut app, key(KeyCode::Char('?')));
        assert!(matches!(app.modal, Some(ModalState::Help { .. })));
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(app.modal.is_none());

        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_closing_edit_form_leaves_list_unchanged() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path());
        signed_in_as(&mut app, "ADMINISTRATIVE_STAFF");
        handle_key(&mut app, key(KeyCode::Down));
        let before = app.lists.patients.items().to_vec();

        app.open_form(true);
        assert!(matches!(app.modal, Some(ModalState::EntityForm(View::Patients))));
        assert_eq!(app.forms.patients.original().map(|p| p.cedula.as_str()), Some("30000001"));
        type_text(&mut app, "zzz");
        handle_key(&mut app, key(KeyCode::Esc));

        assert!(app.modal.is_none());
        assert!(app.forms.patients.original().is_none());
        assert_eq!(app.lists.patients.items(), before.as_slice());
    }

    #[test]
    fn test_failed_save_task_unlocks_form() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path());
        signed_in_as(&mut app, "ADMINISTRATIVE_STAFF");

        handle_key(&mut app, key(KeyCode::Char('n')));
        {
            let ed = app.forms.patients.editor_mut().unwrap();
            ed.set_text("cedula", "12345678");
            ed.set_text("username", "anaruiz");
            ed.set_text("password", "Secret1!");
            ed.set_text("confirmPassword", "Secret1!");
            ed.set_text("fullName", "Ana Ruiz");
            ed.set_text("birthDate", "1990-04-01");
            ed.set_text("gender", "FEMENINO");
            ed.set_text("address", "Calle 1");
            ed.set_text("phoneNumber", "3001234567");
            ed.set_text("email", "ana@mail.co");
        }
        app.forms.patients.prepare_submit(RoleNaming::English).unwrap();
        assert!(app.form_is_submitting(View::Patients));

        app.handle_event(ApiEvent::TaskFailed("task 7 panicked".into()));
        assert!(!app.form_is_submitting(View::Patients));
        assert!(app.forms.patients.submit_error().is_some());
        assert_eq!(app.notifications.visible().last().map(|n| n.severity), Some(Severity::Error));

        handle_key(&mut app, key(KeyCode::Esc));
        assert!(app.modal.is_none());
    }

    #[test]
    fn test_stock_adjust_without_selection_shows_info() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path());
        signed_in_as(&mut app, "SOPORTE_INFORMACION");
        assert_eq!(app.active_view(), Some(View::Inventory));

        handle_key(&mut app, key(KeyCode::Char('s')));
        assert!(app.modal.is_none());
        let last = app.notifications.visible().last().unwrap();
        assert_eq!(last.severity, Severity::Info);
        assert_eq!(last.message, "Select an item first");
    }
}
