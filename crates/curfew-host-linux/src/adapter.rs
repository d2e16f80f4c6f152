//! X11 window host implementation

use curfew_host_api::{
    HostCapabilities, HostError, HostResult, ObservedWindow, WindowHandle, WindowHost,
};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::screensaver;
use x11rb::protocol::xproto::{
    AtomEnum, ClientMessageEvent, ConnectionExt as _, EventMask, KEY_PRESS_EVENT, KEY_RELEASE_EVENT,
    Window,
};
use x11rb::protocol::xtest;
use x11rb::rust_connection::RustConnection;
use x11rb::CURRENT_TIME;

use crate::keyboard::{KeyMap, KeyStroke, keysym};
use crate::process::{TERMINATE_GRACE, process_name, terminate_process};

// Interned once at connection time
x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        _NET_ACTIVE_WINDOW,
        _NET_WM_NAME,
        _NET_WM_PID,
        WM_CHANGE_STATE,
        UTF8_STRING,
    }
}

/// ICCCM `IconicState`
const ICONIC_STATE: u32 = 3;

/// EWMH source indication for requests from pagers and tools
const SOURCE_PAGER: u32 = 2;

/// Longest title read from a window property, in 32-bit units
const MAX_TITLE_WORDS: u32 = 1024;

/// Pause between focusing a window and typing into it
const FOCUS_SETTLE: Duration = Duration::from_millis(200);

/// Pause between keystrokes
const KEY_DELAY: Duration = Duration::from_millis(10);

fn display_error(e: impl fmt::Display) -> HostError {
    HostError::Display(e.to_string())
}

/// Linux window host backed by an X11 connection
pub struct LinuxHost {
    capabilities: HostCapabilities,
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
    keymap: Option<KeyMap>,
}

impl LinuxHost {
    /// Connect to the display named by `$DISPLAY`
    pub fn connect() -> HostResult<Self> {
        let (conn, screen_num) = x11rb::connect(None).map_err(display_error)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| HostError::Display(format!("screen {} not found", screen_num)))?;

        let atoms = Atoms::new(&conn)
            .map_err(display_error)?
            .reply()
            .map_err(display_error)?;

        let has_xtest = has_extension(&conn, xtest::X11_EXTENSION_NAME);
        let has_screensaver = has_extension(&conn, screensaver::X11_EXTENSION_NAME);

        let capabilities = HostCapabilities {
            can_minimize: true,
            can_terminate: true,
            can_force_navigate: has_xtest,
            can_detect_lock: has_screensaver,
        };

        info!(
            screen = screen_num,
            xtest = has_xtest,
            screensaver = has_screensaver,
            "Connected to X display"
        );

        Ok(Self {
            capabilities,
            conn,
            root,
            atoms,
            keymap: None,
        })
    }

    fn active_window(&self) -> HostResult<Option<Window>> {
        let reply = self
            .conn
            .get_property(false, self.root, self.atoms._NET_ACTIVE_WINDOW, AtomEnum::WINDOW, 0, 1)
            .map_err(display_error)?
            .reply()
            .map_err(display_error)?;

        Ok(reply
            .value32()
            .and_then(|mut values| values.next())
            .filter(|&window| window != x11rb::NONE))
    }

    fn window_title(&self, window: Window) -> HostResult<Option<String>> {
        let title = self.text_property(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)?;
        if title.is_some() {
            return Ok(title);
        }
        self.text_property(window, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())
    }

    fn text_property(&self, window: Window, property: u32, kind: u32) -> HostResult<Option<String>> {
        let reply = self
            .conn
            .get_property(false, window, property, kind, 0, MAX_TITLE_WORDS)
            .map_err(display_error)?
            .reply()
            .map_err(display_error)?;

        if reply.value.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()))
    }

    fn window_pid(&self, window: Window) -> HostResult<Option<u32>> {
        let reply = self
            .conn
            .get_property(false, window, self.atoms._NET_WM_PID, AtomEnum::CARDINAL, 0, 1)
            .map_err(display_error)?
            .reply()
            .map_err(display_error)?;

        Ok(reply.value32().and_then(|mut values| values.next()))
    }

    /// Send a 32-bit client message to the root window, as EWMH requires
    fn send_root_message(&self, window: Window, message_type: u32, data: [u32; 5]) -> HostResult<()> {
        let event = ClientMessageEvent::new(32, window, message_type, data);
        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
                event,
            )
            .map_err(display_error)?;
        self.conn.flush().map_err(display_error)
    }

    fn keymap(&mut self) -> HostResult<&KeyMap> {
        if self.keymap.is_none() {
            let setup = self.conn.setup();
            let min = setup.min_keycode;
            let count = setup.max_keycode.saturating_sub(min).saturating_add(1);

            let reply = self
                .conn
                .get_keyboard_mapping(min, count)
                .map_err(display_error)?
                .reply()
                .map_err(display_error)?;

            debug!(keycodes = count, "Keyboard mapping loaded");
            self.keymap = Some(KeyMap::from_mapping(min, reply.keysyms_per_keycode, &reply.keysyms));
        }

        self.keymap
            .as_ref()
            .ok_or_else(|| HostError::Internal("keyboard mapping unavailable".into()))
    }

    fn key(&mut self, sym: u32) -> HostResult<KeyStroke> {
        self.keymap()?
            .lookup(sym)
            .ok_or_else(|| HostError::Display(format!("no key produces keysym {:#x}", sym)))
    }

    fn fake_key(&self, keycode: u8, pressed: bool) -> HostResult<()> {
        let kind = if pressed { KEY_PRESS_EVENT } else { KEY_RELEASE_EVENT };
        xtest::fake_input(&self.conn, kind, keycode, CURRENT_TIME, self.root, 0, 0, 0)
            .map_err(display_error)?;
        Ok(())
    }

    /// Press and release `stroke`, holding `modifier` around it if given
    fn tap(&self, stroke: KeyStroke, modifier: Option<u8>) -> HostResult<()> {
        if let Some(modifier) = modifier {
            self.fake_key(modifier, true)?;
        }
        self.fake_key(stroke.keycode, true)?;
        self.fake_key(stroke.keycode, false)?;
        if let Some(modifier) = modifier {
            self.fake_key(modifier, false)?;
        }
        self.conn.flush().map_err(display_error)?;
        std::thread::sleep(KEY_DELAY);
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> HostResult<()> {
        let shift = self.key(keysym::SHIFT_L)?.keycode;
        for c in text.chars() {
            let stroke = self
                .keymap()?
                .lookup_char(c)
                .ok_or_else(|| HostError::Display(format!("cannot type {:?}", c)))?;
            self.tap(stroke, stroke.shift.then_some(shift))?;
        }
        Ok(())
    }
}

fn has_extension(conn: &RustConnection, name: &'static str) -> bool {
    matches!(conn.extension_information(name), Ok(Some(_)))
}

fn x11_window(handle: WindowHandle) -> HostResult<Window> {
    Window::try_from(handle.raw())
        .map_err(|_| HostError::Internal(format!("{} is not an X11 window", handle)))
}

impl WindowHost for LinuxHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    fn observed_window(&mut self) -> HostResult<Option<ObservedWindow>> {
        let Some(window) = self.active_window()? else {
            return Ok(None);
        };

        let title = self.window_title(window)?;
        let pid = self.window_pid(window)?.unwrap_or(0);
        let process_name = if pid != 0 { process_name(pid) } else { None };

        Ok(Some(ObservedWindow::new(
            WindowHandle::new(u64::from(window)),
            pid,
            process_name,
            title,
        )))
    }

    fn is_session_locked(&mut self) -> HostResult<bool> {
        if !self.capabilities.can_detect_lock {
            return Err(HostError::Unsupported);
        }

        let info = screensaver::query_info(&self.conn, self.root)
            .map_err(display_error)?
            .reply()
            .map_err(display_error)?;

        Ok(u8::from(info.state) == u8::from(screensaver::State::ON))
    }

    fn minimize(&mut self, handle: WindowHandle) -> HostResult<()> {
        let window = x11_window(handle)?;
        self.send_root_message(window, self.atoms.WM_CHANGE_STATE, [ICONIC_STATE, 0, 0, 0, 0])?;
        debug!(window = %handle, "Minimize requested");
        Ok(())
    }

    fn terminate(&mut self, pid: u32) -> HostResult<()> {
        terminate_process(pid, TERMINATE_GRACE)
    }

    fn force_navigate(&mut self, handle: WindowHandle, url: &str) -> HostResult<()> {
        if !self.capabilities.can_force_navigate {
            return Err(HostError::Unsupported);
        }

        let window = x11_window(handle)?;
        self.send_root_message(
            window,
            self.atoms._NET_ACTIVE_WINDOW,
            [SOURCE_PAGER, CURRENT_TIME, 0, 0, 0],
        )?;
        std::thread::sleep(FOCUS_SETTLE);

        let control = self.key(keysym::CONTROL_L)?.keycode;
        let location = self.keymap()?.lookup_char('l').ok_or_else(|| {
            HostError::Display("no key produces 'l'".into())
        })?;
        self.tap(location, Some(control))?;

        self.type_text(url)?;

        let enter = self.key(keysym::RETURN)?;
        self.tap(enter, None)?;

        debug!(window = %handle, url, "Navigation typed");
        Ok(())
    }
}
