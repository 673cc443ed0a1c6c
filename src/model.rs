//! Base for user-defined models.
//!
//! A model wraps a root object (typically an accessible element or a
//! parent model) and the device it lives on. The helpers on [`ModelBase`]
//! turn plain arguments into well-formed device events addressed at the
//! accessibility root.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::constants::{MouseButton, MouseEventKind, keycode_for, keysym_for};
use crate::devices::{Device, DeviceParams, ExecResult};
use crate::error::ModelError;

pub use crate::devices::AccessibilityPath;

/// Convert a coordinate to the device's coordinate space.
fn coordinate(axis: &'static str, value: i64) -> Result<i32, ModelError> {
    i32::try_from(value).map_err(|_| ModelError::InvalidCoordinate { axis, value })
}

/// Helpers shared by every model.
///
/// Implementors provide [`root`](Self::root) and [`device`](Self::device);
/// everything else forwards to the device.
pub trait ModelBase {
    /// What the model wraps.
    type Root;

    /// The wrapped object.
    fn root(&self) -> &Self::Root;

    /// Device events are sent to.
    fn device(&self) -> &dyn Device;

    /// Send a mouse event at screen coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidCoordinate`] if a coordinate does not
    /// fit, or the device error.
    fn mouse_at(
        &self,
        x: i64,
        y: i64,
        button: MouseButton,
        event: MouseEventKind,
    ) -> Result<bool, ModelError> {
        let x = coordinate("x", x)?;
        let y = coordinate("y", y)?;
        let path = AccessibilityPath::root();
        Ok(self.device().mouse_event(&path, x, y, button, event)?)
    }

    /// Click `button` at `(x, y)`.
    ///
    /// # Errors
    ///
    /// See [`mouse_at`](Self::mouse_at).
    fn click_mouse_at(&self, x: i64, y: i64, button: MouseButton) -> Result<bool, ModelError> {
        self.mouse_at(x, y, button, MouseEventKind::Click)
    }

    /// Double-click `button` at `(x, y)`.
    ///
    /// # Errors
    ///
    /// See [`mouse_at`](Self::mouse_at).
    fn double_click_mouse_at(
        &self,
        x: i64,
        y: i64,
        button: MouseButton,
    ) -> Result<bool, ModelError> {
        self.mouse_at(x, y, button, MouseEventKind::DoubleClick)
    }

    /// Press `button` at `(x, y)`.
    ///
    /// # Errors
    ///
    /// See [`mouse_at`](Self::mouse_at).
    fn press_mouse_at(&self, x: i64, y: i64, button: MouseButton) -> Result<bool, ModelError> {
        self.mouse_at(x, y, button, MouseEventKind::Press)
    }

    /// Release `button` at `(x, y)`.
    ///
    /// # Errors
    ///
    /// See [`mouse_at`](Self::mouse_at).
    fn release_mouse_at(&self, x: i64, y: i64, button: MouseButton) -> Result<bool, ModelError> {
        self.mouse_at(x, y, button, MouseEventKind::Release)
    }

    /// Move the pointer to `(x, y)`.
    ///
    /// # Errors
    ///
    /// See [`mouse_at`](Self::mouse_at).
    fn move_mouse_to(&self, x: i64, y: i64) -> Result<bool, ModelError> {
        self.mouse_at(x, y, MouseButton::Left, MouseEventKind::AbsoluteMotion)
    }

    /// Type a key, holding the named modifiers.
    ///
    /// `key` is a single character or a key name such as `"ENTER"`;
    /// modifiers are names such as `"CONTROL"` or `"SHIFT"`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownKey`] or [`ModelError::UnknownModifier`]
    /// for unrecognized names, or the device error.
    fn generate_key(&self, key: &str, modifiers: &[&str]) -> Result<bool, ModelError> {
        let keysym = keysym_for(key).ok_or_else(|| ModelError::UnknownKey(key.to_string()))?;
        let codes = modifiers
            .iter()
            .map(|m| keycode_for(m).ok_or_else(|| ModelError::UnknownModifier((*m).to_string())))
            .collect::<Result<Vec<u32>, ModelError>>()?;
        let path = AccessibilityPath::root();
        Ok(self.device().keyboard_event(&path, keysym, &codes)?)
    }

    /// Press the up arrow.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn key_up(&self) -> Result<bool, ModelError> {
        self.generate_key("UP", &[])
    }

    /// Press the down arrow.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn key_down(&self) -> Result<bool, ModelError> {
        self.generate_key("DOWN", &[])
    }

    /// Press the left arrow.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn key_left(&self) -> Result<bool, ModelError> {
        self.generate_key("LEFT", &[])
    }

    /// Press the right arrow.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn key_right(&self) -> Result<bool, ModelError> {
        self.generate_key("RIGHT", &[])
    }

    /// Press Enter.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn key_enter(&self) -> Result<bool, ModelError> {
        self.generate_key("ENTER", &[])
    }

    /// Press Escape.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn key_escape(&self) -> Result<bool, ModelError> {
        self.generate_key("ESCAPE", &[])
    }

    /// Press Tab.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn key_tab(&self) -> Result<bool, ModelError> {
        self.generate_key("TAB", &[])
    }

    /// Press Backspace.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn key_backspace(&self) -> Result<bool, ModelError> {
        self.generate_key("BACKSPACE", &[])
    }

    /// Run a shell command on the device.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn system_command(&self, command: &str, wait: bool) -> Result<ExecResult, ModelError> {
        Ok(self.device().system_exec(command, wait)?)
    }

    /// Fetch a file from the device.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn get_file(&self, path: &str) -> Result<Vec<u8>, ModelError> {
        Ok(self.device().get_file(path)?)
    }

    /// Store a file on the device.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn send_file(&self, path: &str, data: &[u8]) -> Result<bool, ModelError> {
        Ok(self.device().put_file(path, data)?)
    }

    /// Call a protocol extension.
    ///
    /// # Errors
    ///
    /// Returns the device error.
    fn protocol_extension(
        &self,
        name: &str,
        params: &DeviceParams,
    ) -> Result<BTreeMap<String, String>, ModelError> {
        Ok(self.device().extension(name, params)?)
    }
}

/// A model over any root.
pub struct Model<R> {
    device: Arc<dyn Device>,
    root: R,
}

impl<R: fmt::Debug> fmt::Debug for Model<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("device", &self.device.name())
            .field("root", &self.root)
            .finish()
    }
}

impl<R> Model<R> {
    /// Wrap `root` on `device`.
    pub const fn new(device: Arc<dyn Device>, root: R) -> Self {
        Self { device, root }
    }

    /// Shared handle to the device.
    #[must_use]
    pub const fn device_handle(&self) -> &Arc<dyn Device> {
        &self.device
    }

    /// Unwrap into the root.
    pub fn into_root(self) -> R {
        self.root
    }
}

impl<R> ModelBase for Model<R> {
    type Root = R;

    fn root(&self) -> &R {
        &self.root
    }

    fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::DeviceError;
    use crate::locale::LocaleSource;

    mockall::mock! {
        Dev {}

        impl LocaleSource for Dev {
            fn locale(&self) -> String;
        }

        impl Device for Dev {
            fn name(&self) -> &str;
            fn address(&self) -> String;
            fn port(&self) -> u16;
            fn params(&self) -> DeviceParams;
            fn set_param(&self, key: &str, value: &str);
            fn mouse_event(
                &self,
                path: &AccessibilityPath,
                x: i32,
                y: i32,
                button: MouseButton,
                event: MouseEventKind,
            ) -> Result<bool, DeviceError>;
            fn keyboard_event(
                &self,
                path: &AccessibilityPath,
                keysym: u32,
                modifiers: &[u32],
            ) -> Result<bool, DeviceError>;
            fn system_exec(&self, command: &str, wait: bool) -> Result<ExecResult, DeviceError>;
            fn get_file(&self, path: &str) -> Result<Vec<u8>, DeviceError>;
            fn put_file(&self, path: &str, data: &[u8]) -> Result<bool, DeviceError>;
            fn extension(
                &self,
                name: &str,
                params: &DeviceParams,
            ) -> Result<BTreeMap<String, String>, DeviceError>;
        }
    }

    impl fmt::Debug for MockDev {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("MockDev").finish_non_exhaustive()
        }
    }

    fn model(device: MockDev) -> Model<&'static str> {
        Model::new(Arc::new(device), "window")
    }

    #[test]
    fn click_forwards_to_root_path() {
        let mut device = MockDev::new();
        device
            .expect_mouse_event()
            .withf(|path, x, y, button, event| {
                *path == AccessibilityPath::root()
                    && *x == 10
                    && *y == -5
                    && *button == MouseButton::Right
                    && *event == MouseEventKind::Click
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(true));
        let model = model(device);
        assert!(model.click_mouse_at(10, -5, MouseButton::Right).unwrap());
        assert_eq!(*model.root(), "window");
    }

    #[test]
    fn move_uses_absolute_motion() {
        let mut device = MockDev::new();
        device
            .expect_mouse_event()
            .withf(|_, _, _, _, event| *event == MouseEventKind::AbsoluteMotion)
            .times(1)
            .returning(|_, _, _, _, _| Ok(true));
        assert!(model(device).move_mouse_to(1, 2).unwrap());
    }

    #[test]
    fn oversized_coordinate_is_rejected_before_sending() {
        let mut device = MockDev::new();
        device.expect_mouse_event().never();
        let err = model(device)
            .press_mouse_at(i64::from(i32::MAX) + 1, 0, MouseButton::Left)
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidCoordinate { axis: "x", .. }));
    }

    #[test]
    fn generate_key_maps_names_and_modifiers() {
        let mut device = MockDev::new();
        device
            .expect_keyboard_event()
            .withf(|_, keysym, modifiers| *keysym == 0x61 && modifiers == [37, 50])
            .times(1)
            .returning(|_, _, _| Ok(true));
        device
            .expect_keyboard_event()
            .withf(|_, keysym, modifiers| *keysym == 0xff0d && modifiers.is_empty())
            .times(1)
            .returning(|_, _, _| Ok(true));
        let model = model(device);
        assert!(model.generate_key("a", &["CONTROL", "shift"]).unwrap());
        assert!(model.key_enter().unwrap());
    }

    #[test]
    fn unknown_key_names_fail() {
        let mut device = MockDev::new();
        device.expect_keyboard_event().never();
        let model = model(device);
        assert!(matches!(
            model.generate_key("NOT_A_KEY", &[]),
            Err(ModelError::UnknownKey(k)) if k == "NOT_A_KEY"
        ));
        assert!(matches!(
            model.generate_key("a", &["HYPER"]),
            Err(ModelError::UnknownModifier(m)) if m == "HYPER"
        ));
    }

    #[test]
    fn system_helpers_delegate() {
        let mut device = MockDev::new();
        device
            .expect_system_exec()
            .withf(|command, wait| command == "ls" && *wait)
            .returning(|_, _| {
                Ok(ExecResult {
                    stdout: "a\n".to_string(),
                    stderr: String::new(),
                    success: true,
                    code: Some(0),
                })
            });
        device
            .expect_put_file()
            .withf(|path, data| path == "/tmp/x" && data == b"hi")
            .returning(|_, _| Ok(true));
        device.expect_get_file().returning(|path| {
            Err(DeviceError::Remote {
                device: "dev".to_string(),
                message: format!("{path} missing"),
            })
        });
        let model = model(device);
        assert_eq!(model.system_command("ls", true).unwrap().stdout, "a\n");
        assert!(model.send_file("/tmp/x", b"hi").unwrap());
        assert!(matches!(
            model.get_file("/nope"),
            Err(ModelError::Device(DeviceError::Remote { .. }))
        ));
    }

    #[test]
    fn protocol_extension_passes_params() {
        let mut device = MockDev::new();
        device
            .expect_extension()
            .withf(|name, params| name == "screenshot" && params.get("scale") == Some("2"))
            .returning(|_, _| Ok(BTreeMap::from([("status".to_string(), "ok".to_string())])));
        let params = DeviceParams::new().with("scale", &2);
        let reply = model(device).protocol_extension("screenshot", &params).unwrap();
        assert_eq!(reply.get("status").map(String::as_str), Some("ok"));
    }
}
