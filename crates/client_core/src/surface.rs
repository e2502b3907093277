pub trait DialogSurface: Send + Sync {
    fn set_title(&self, title: &str);
    fn set_body(&self, html: &str);
    /// Programmatic hide. The toolkit's close event is expected to reach
    /// [`crate::ModalController::close`] afterwards; closing twice is harmless.
    fn hide(&self);
}

pub trait PageHost: Send + Sync {
    /// Full reload of the hosting page after a successful mutation.
    fn reload(&self);
}
