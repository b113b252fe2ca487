use crate::ui::settings::SettingsHandle;
use crate::ui::theme;
use crate::ui::visualization::{MagnitudeSubscription, RibbonState, SpriteTicker, ribbon_widget};
use async_channel::Receiver as AsyncReceiver;
use iced::advanced::subscription::from_recipe;
use iced::widget::container;
use iced::{Element, Length, Size, Subscription, Task, Theme, window};
use std::sync::Arc;
use tracing::debug;

pub struct UiConfig {
    settings: SettingsHandle,
    magnitudes: Arc<AsyncReceiver<Vec<f32>>>,
    frame_len: usize,
}

impl UiConfig {
    pub fn new(
        settings: SettingsHandle,
        magnitudes: Arc<AsyncReceiver<Vec<f32>>>,
        frame_len: usize,
    ) -> Self {
        Self {
            settings,
            magnitudes,
            frame_len,
        }
    }
}

pub fn run(config: UiConfig) -> iced::Result {
    let window_size = config.settings.borrow().settings().window.size();

    iced::application(move || UiApp::new(&config), update, view)
        .title("Ribbonmeter")
        .window_size(window_size)
        .resizable(true)
        .theme(UiApp::theme)
        .subscription(UiApp::subscription)
        .run()
}

#[derive(Debug)]
struct UiApp {
    settings: SettingsHandle,
    magnitudes: Arc<AsyncReceiver<Vec<f32>>>,
    frame_len: usize,
    ribbon: RibbonState,
    ticker: SpriteTicker,
    theme: Theme,
}

#[derive(Debug, Clone)]
enum Message {
    Magnitudes(Vec<f32>),
    SpriteTick,
    WindowResized(Size),
}

impl UiApp {
    fn new(config: &UiConfig) -> (Self, Task<Message>) {
        let settings = config.settings.clone();
        let (ribbon, ticker, theme) = {
            let manager = settings.borrow();
            let data = manager.settings();
            let sprite = data.sprite.load_sheet();
            (
                RibbonState::new(
                    data.ribbon.bands,
                    data.ribbon.history_length,
                    data.ribbon.style(),
                    sprite,
                ),
                SpriteTicker::new(data.sprite.frame_interval()),
                theme::theme(data.ribbon.background.into()),
            )
        };

        (
            Self {
                settings,
                magnitudes: Arc::clone(&config.magnitudes),
                frame_len: config.frame_len,
                ribbon,
                ticker,
                theme,
            },
            Task::none(),
        )
    }

    fn theme(&self) -> Theme {
        self.theme.clone()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            from_recipe(MagnitudeSubscription::new(
                Arc::clone(&self.magnitudes),
                self.frame_len,
            ))
            .map(Message::Magnitudes),
            from_recipe(self.ticker).map(|()| Message::SpriteTick),
            window::resize_events().map(|(_id, size)| Message::WindowResized(size)),
        ])
    }
}

fn update(app: &mut UiApp, message: Message) -> Task<Message> {
    match message {
        Message::Magnitudes(frame) => app.ribbon.push_magnitudes(&frame),
        Message::SpriteTick => app.ribbon.tick_sprite(),
        Message::WindowResized(size) => {
            debug!("[ui] window resized to {}x{}", size.width, size.height);
            app.settings
                .update(|m| m.set_window_size(size.width, size.height));
            app.ribbon.invalidate();
        }
    }
    Task::none()
}

fn view(app: &UiApp) -> Element<'_, Message> {
    container(ribbon_widget(&app.ribbon))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
