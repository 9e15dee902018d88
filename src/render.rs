//! Overlay rendering boundary.
//!
//! The stabilizer emits `RenderCommand`s; whatever draws them lives behind the
//! `Renderer` trait. Drawing must be idempotent: the cooldown phase repeats
//! `ShowIcon` every frame and the renderer must not flicker or re-do work.
//! The geometry helpers mirror the on-screen overlay layer: boxes are scaled
//! from source-image coordinates into view coordinates, the confirmation icon
//! sits in a fixed square near the top-left corner.

use anyhow::Result;

use crate::stabilize::{BoundingRegion, RenderCommand};

/// Overlay sink for render commands.
///
/// Repeated identical commands must be side-effect-free.
pub trait Renderer: Send {
    fn render(&mut self, command: &RenderCommand) -> Result<()>;
}

// ----------------------------------------------------------------------------
// Geometry
// ----------------------------------------------------------------------------

/// View-space geometry for the overlay layer.
#[derive(Clone, Copy, Debug)]
pub struct OverlayLayout {
    pub view_width: u32,
    pub view_height: u32,
}

const ICON_MARGIN: i32 = 30;

impl OverlayLayout {
    pub fn new(view_width: u32, view_height: u32) -> Self {
        Self {
            view_width,
            view_height,
        }
    }

    /// Scale factor from source-image coordinates to view coordinates.
    ///
    /// The camera image is fitted to cover the view, so the larger of the two
    /// axis ratios wins.
    pub fn scale_factor(&self, image_width: u32, image_height: u32) -> f32 {
        if image_width == 0 || image_height == 0 {
            return 1.0;
        }
        let wx = self.view_width as f32 / image_width as f32;
        let wy = self.view_height as f32 / image_height as f32;
        wx.max(wy)
    }

    /// Map a detection region into view coordinates.
    pub fn scaled_region(
        &self,
        region: BoundingRegion,
        image_width: u32,
        image_height: u32,
    ) -> BoundingRegion {
        let scale = self.scale_factor(image_width, image_height);
        BoundingRegion {
            top: region.top * scale,
            left: region.left * scale,
            bottom: region.bottom * scale,
            right: region.right * scale,
        }
    }

    /// Square the confirmation icon is drawn into: inset from the top-left
    /// corner, sized to four fifths of the view width.
    pub fn icon_bounds(&self) -> (i32, i32, i32, i32) {
        let side = self.view_width as i32 - self.view_width as i32 / 5;
        (ICON_MARGIN, ICON_MARGIN, side, side)
    }
}

// ----------------------------------------------------------------------------
// Renderers
// ----------------------------------------------------------------------------

/// Decorator that swallows repeated identical commands so the inner renderer
/// only sees actual visual transitions.
pub struct DedupRenderer<R: Renderer> {
    inner: R,
    last: Option<RenderCommand>,
}

impl<R: Renderer> DedupRenderer<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, last: None }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Renderer> Renderer for DedupRenderer<R> {
    fn render(&mut self, command: &RenderCommand) -> Result<()> {
        if self.last.as_ref() == Some(command) {
            return Ok(());
        }
        self.inner.render(command)?;
        self.last = Some(command.clone());
        Ok(())
    }
}

/// Log-only renderer for stub daemon runs.
pub struct ConsoleRenderer {
    layout: OverlayLayout,
}

impl ConsoleRenderer {
    pub fn new(layout: OverlayLayout) -> Self {
        Self { layout }
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&mut self, command: &RenderCommand) -> Result<()> {
        match command {
            RenderCommand::HideOverlay => log::debug!("overlay hidden"),
            RenderCommand::ShowBox { region, label } => {
                log::info!(
                    "box '{}' at [{:.0},{:.0})x[{:.0},{:.0})",
                    label,
                    region.left,
                    region.right,
                    region.top,
                    region.bottom
                );
            }
            RenderCommand::ShowIcon => {
                let (left, top, right, bottom) = self.layout.icon_bounds();
                log::info!("icon at ({},{})..({},{})", left, top, right, bottom);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingRenderer {
        commands: Vec<RenderCommand>,
    }

    impl Renderer for CountingRenderer {
        fn render(&mut self, command: &RenderCommand) -> Result<()> {
            self.commands.push(command.clone());
            Ok(())
        }
    }

    #[test]
    fn scale_factor_uses_larger_axis_ratio() {
        // 4:3 image in a taller view: height ratio dominates.
        let layout = OverlayLayout::new(720, 1280);
        let scale = layout.scale_factor(480, 640);
        assert!((scale - 2.0).abs() < 1e-6);

        // Degenerate image dimensions fall back to identity.
        assert!((layout.scale_factor(0, 640) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn regions_scale_uniformly() {
        let layout = OverlayLayout::new(1280, 960);
        let region = BoundingRegion {
            top: 10.0,
            left: 20.0,
            bottom: 110.0,
            right: 220.0,
        };
        let scaled = layout.scaled_region(region, 640, 480);
        assert!((scaled.top - 20.0).abs() < 1e-4);
        assert!((scaled.right - 440.0).abs() < 1e-4);
    }

    #[test]
    fn icon_square_is_inset_from_corner() {
        let layout = OverlayLayout::new(1000, 800);
        assert_eq!(layout.icon_bounds(), (30, 30, 800, 800));
    }

    #[test]
    fn dedup_renderer_drops_repeats() {
        let mut renderer = DedupRenderer::new(CountingRenderer { commands: vec![] });

        for _ in 0..5 {
            renderer.render(&RenderCommand::ShowIcon).unwrap();
        }
        renderer.render(&RenderCommand::HideOverlay).unwrap();
        renderer.render(&RenderCommand::ShowIcon).unwrap();

        let inner = renderer.into_inner();
        assert_eq!(
            inner.commands,
            vec![
                RenderCommand::ShowIcon,
                RenderCommand::HideOverlay,
                RenderCommand::ShowIcon
            ]
        );
    }
}
