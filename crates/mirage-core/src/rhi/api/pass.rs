// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Render passes and framebuffers.
//!
//! A [`RenderPass`] is a compatibility descriptor: the attachment formats
//! and sample count a pipeline and a framebuffer must agree on. A
//! [`Framebuffer`] binds concrete texture attachments to one render pass;
//! a pipeline created for render pass A may only draw into framebuffers
//! whose render pass is compatible with A.

use crate::math::Extent3D;
use crate::rhi::api::resource::{NativeObject, ResourceId, ResourceKind, RhiResource};
use crate::rhi::api::texture::{SampleCount, TextureFormat, TextureHandle, TextureUsage};
use crate::rhi::error::FramebufferError;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A descriptor used to create a [`RenderPass`].
#[derive(Debug, Clone)]
pub struct RenderPassDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The color attachment formats, in attachment order.
    pub color_formats: Cow<'a, [TextureFormat]>,
    /// The depth-stencil attachment format, if any.
    pub depth_stencil_format: Option<TextureFormat>,
    /// The sample count shared by all attachments.
    pub sample_count: SampleCount,
}

/// A render pass compatibility descriptor.
pub struct RenderPass {
    id: ResourceId,
    label: Option<String>,
    color_formats: Vec<TextureFormat>,
    depth_stencil_format: Option<TextureFormat>,
    sample_count: SampleCount,
    native: NativeObject,
}

/// A shared handle to a [`RenderPass`].
pub type RenderPassHandle = Arc<RenderPass>;

impl RenderPass {
    /// Wraps a backend-native pass object. Called by backend
    /// implementations only.
    pub fn new(descriptor: &RenderPassDescriptor<'_>, native: NativeObject) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            color_formats: descriptor.color_formats.to_vec(),
            depth_stencil_format: descriptor.depth_stencil_format,
            sample_count: descriptor.sample_count,
            native,
        }
    }

    /// The color attachment formats in attachment order.
    pub fn color_formats(&self) -> &[TextureFormat] {
        &self.color_formats
    }

    /// The depth-stencil format, if declared.
    pub fn depth_stencil_format(&self) -> Option<TextureFormat> {
        self.depth_stencil_format
    }

    /// The sample count shared by all attachments.
    pub fn sample_count(&self) -> SampleCount {
        self.sample_count
    }

    /// Whether two render passes are compatible: same attachment count,
    /// formats, and sample count. A pipeline built for one may draw into a
    /// framebuffer built for the other.
    pub fn is_compatible_with(&self, other: &RenderPass) -> bool {
        self.color_formats == other.color_formats
            && self.depth_stencil_format == other.depth_stencil_format
            && self.sample_count == other.sample_count
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for RenderPass {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::RenderPass
    }
}

impl fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPass")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("color_formats", &self.color_formats)
            .field("depth_stencil_format", &self.depth_stencil_format)
            .field("sample_count", &self.sample_count)
            .finish_non_exhaustive()
    }
}

/// A descriptor used to create a [`Framebuffer`].
#[derive(Debug, Clone)]
pub struct FramebufferDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The render pass the framebuffer is bound to.
    pub render_pass: RenderPassHandle,
    /// The color attachments, in declaration order.
    pub color_attachments: Cow<'a, [TextureHandle]>,
    /// The depth-stencil attachment, if the render pass declares one.
    pub depth_stencil_attachment: Option<TextureHandle>,
}

/// Validates framebuffer attachments against the render pass declaration.
///
/// Every backend calls this before creating its native object. Checks:
/// attachment count, per-attachment format, render-attachment usage,
/// sample counts, matching extents, and depth-stencil presence.
pub fn validate_framebuffer(
    descriptor: &FramebufferDescriptor<'_>,
) -> Result<(), FramebufferError> {
    let pass = &descriptor.render_pass;
    if descriptor.color_attachments.len() != pass.color_formats().len() {
        return Err(FramebufferError::AttachmentCountMismatch {
            expected: pass.color_formats().len() as u32,
            actual: descriptor.color_attachments.len() as u32,
        });
    }

    let mut extent: Option<Extent3D> = None;
    for (index, (attachment, format)) in descriptor
        .color_attachments
        .iter()
        .zip(pass.color_formats())
        .enumerate()
    {
        let index = index as u32;
        if attachment.format() != *format {
            return Err(FramebufferError::FormatMismatch {
                index,
                details: format!("declared {:?}, supplied {:?}", format, attachment.format()),
            });
        }
        if !attachment.usage().contains(TextureUsage::RENDER_ATTACHMENT) {
            return Err(FramebufferError::NotRenderable { index });
        }
        if attachment.sample_count() != pass.sample_count() {
            return Err(FramebufferError::SampleCountMismatch { index });
        }
        if *extent.get_or_insert(attachment.size()) != attachment.size() {
            return Err(FramebufferError::ExtentMismatch);
        }
    }

    match (&descriptor.depth_stencil_attachment, pass.depth_stencil_format()) {
        (None, None) => {}
        (Some(attachment), Some(format)) => {
            if attachment.format() != format {
                return Err(FramebufferError::DepthStencilMismatch);
            }
            if !attachment
                .usage()
                .contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT)
            {
                return Err(FramebufferError::DepthStencilMismatch);
            }
            if let Some(extent) = extent {
                if attachment.size() != extent {
                    return Err(FramebufferError::ExtentMismatch);
                }
            }
        }
        _ => return Err(FramebufferError::DepthStencilMismatch),
    }

    Ok(())
}

/// A framebuffer: concrete texture attachments bound to a render pass.
///
/// Holds handles to its render pass and every attachment.
pub struct Framebuffer {
    id: ResourceId,
    label: Option<String>,
    render_pass: RenderPassHandle,
    color_attachments: Vec<TextureHandle>,
    depth_stencil_attachment: Option<TextureHandle>,
    native: NativeObject,
}

/// A shared handle to a [`Framebuffer`].
pub type FramebufferHandle = Arc<Framebuffer>;

impl Framebuffer {
    /// Wraps a backend-native framebuffer object. Called by backend
    /// implementations only, after [`validate_framebuffer`] passed.
    pub fn new(descriptor: &FramebufferDescriptor<'_>, native: NativeObject) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            render_pass: Arc::clone(&descriptor.render_pass),
            color_attachments: descriptor.color_attachments.to_vec(),
            depth_stencil_attachment: descriptor.depth_stencil_attachment.clone(),
            native,
        }
    }

    /// The render pass the framebuffer is bound to.
    pub fn render_pass(&self) -> &RenderPassHandle {
        &self.render_pass
    }

    /// The color attachments in declaration order.
    pub fn color_attachments(&self) -> &[TextureHandle] {
        &self.color_attachments
    }

    /// The depth-stencil attachment, if any.
    pub fn depth_stencil_attachment(&self) -> Option<&TextureHandle> {
        self.depth_stencil_attachment.as_ref()
    }

    /// The pixel extent shared by the attachments, if there are any.
    pub fn extent(&self) -> Option<Extent3D> {
        self.color_attachments
            .first()
            .or(self.depth_stencil_attachment.as_ref())
            .map(|t| t.size())
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for Framebuffer {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Framebuffer
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framebuffer")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("color_attachments", &self.color_attachments.len())
            .field(
                "has_depth_stencil",
                &self.depth_stencil_attachment.is_some(),
            )
            .finish_non_exhaustive()
    }
}
