use crate::{BootstrapConfig, GraphicsContext, VulkanDriver};
use anyhow::Result;
use ash::vk;
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

/// windowとGraphicsContextを持つアプリケーション
pub struct App;
impl App {
    /// windowを開いてGraphicsContextを作成し、windowが閉じられるまでイベントを待つ
    pub fn run(config: BootstrapConfig) -> Result<()> {
        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(config.window_title.as_str())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(false)
            .build(&event_loop)?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let driver = VulkanDriver::new(&window);
        let size = window.inner_size();
        let framebuffer_size = vk::Extent2D {
            width: size.width,
            height: size.height,
        };
        let context = GraphicsContext::new(&driver, &config, framebuffer_size)?;

        run_with_context(context, |context| {
            event_loop.run(|event, elwt| match event {
                Event::WindowEvent {
                    window_id,
                    event: WindowEvent::CloseRequested,
                } if window_id == window.id() => {
                    elwt.exit();
                }
                Event::LoopExiting => {
                    // windowより先にVulkanのオブジェクトを破棄する
                    context.take();
                }
                _ => (),
            })
        })?;
        Ok(())
    }
}

/// contextを渡して`run`を実行し、`run`が返った時点でcontextを破棄する関数。
/// `run`がエラーを返した場合でも、呼び出し元のwindowより先にcontextが破棄される。
fn run_with_context<C, T>(context: C, run: impl FnOnce(&mut Option<C>) -> T) -> T {
    let mut context = Some(context);
    let result = run(&mut context);
    drop(context);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    struct Recorder(&'static str, Rc<RefCell<Vec<&'static str>>>);
    impl Drop for Recorder {
        fn drop(&mut self) {
            self.1.borrow_mut().push(self.0);
        }
    }

    #[test]
    fn context_is_released_before_returning_an_error() {
        let ledger = Rc::new(RefCell::new(Vec::new()));
        let window = Recorder("window", ledger.clone());

        let result: Result<()> = run_with_context(Recorder("context", ledger.clone()), |_| {
            Err(anyhow::anyhow!("event loop failed"))
        });

        assert!(result.is_err());
        assert_eq!(*ledger.borrow(), ["context"]);
        drop(window);
        assert_eq!(*ledger.borrow(), ["context", "window"]);
    }

    #[test]
    fn context_taken_inside_run_is_released_once() {
        let ledger = Rc::new(RefCell::new(Vec::new()));

        run_with_context(Recorder("context", ledger.clone()), |context| {
            context.take();
            assert_eq!(*ledger.borrow(), ["context"]);
        });

        assert_eq!(*ledger.borrow(), ["context"]);
    }
}
