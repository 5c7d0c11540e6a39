use anyhow::Result;
use ash::vk;
use std::ffi::CStr;

/// shaderのentry point
pub const SHADER_ENTRY_POINT: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") };

/// 描画時に設定するdynamic state
pub const DYNAMIC_STATES: [vk::DynamicState; 2] =
    [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];

/// swapchainのimageに描画するcolor attachmentの記述。
/// clearしてからstoreし、描画後はpresent用のlayoutに遷移する。
pub fn color_attachment_description(format: vk::Format) -> vk::AttachmentDescription {
    vk::AttachmentDescription::builder()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
        .build()
}

/// color attachmentを1つ持つsubpass1つだけのrender passを作成する関数
pub fn create_render_pass(
    device: &crate::DeviceHandle,
    format: vk::Format,
) -> Result<crate::RenderPassHandle> {
    let color_attachment = color_attachment_description(format);
    let color_attachment_ref = vk::AttachmentReference::builder()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
        .build();

    let subpass = vk::SubpassDescription::builder()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(std::slice::from_ref(&color_attachment_ref))
        .build();

    let render_pass_create_info = vk::RenderPassCreateInfo::builder()
        .attachments(std::slice::from_ref(&color_attachment))
        .subpasses(std::slice::from_ref(&subpass));

    device.create_render_pass(&render_pass_create_info)
}

/// descriptor set layoutもpush constantも持たないpipeline layoutを作成する関数
pub fn create_empty_pipeline_layout(
    device: &crate::DeviceHandle,
) -> Result<crate::PipelineLayoutHandle> {
    let pipeline_layout_create_info = vk::PipelineLayoutCreateInfo::builder();
    device.create_pipeline_layout(&pipeline_layout_create_info)
}

/// 裏面をcullingする塗りつぶしのrasterization state
pub fn rasterization_state() -> vk::PipelineRasterizationStateCreateInfo {
    vk::PipelineRasterizationStateCreateInfo::builder()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(vk::CullModeFlags::BACK)
        .front_face(vk::FrontFace::CLOCKWISE)
        .depth_bias_enable(false)
        .build()
}

/// blendしないcolor blend attachment state
pub fn color_blend_attachment_state() -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState::builder()
        .color_write_mask(
            vk::ColorComponentFlags::R
                | vk::ColorComponentFlags::G
                | vk::ColorComponentFlags::B
                | vk::ColorComponentFlags::A,
        )
        .blend_enable(false)
        .build()
}

/// vertex shaderとfragment shaderからgraphics pipelineを作成する関数。
/// vertex inputは持たず、viewportとscissorは描画時に設定する。
pub fn create_graphics_pipeline(
    device: &crate::DeviceHandle,
    pipeline_layout: &crate::PipelineLayoutHandle,
    render_pass: &crate::RenderPassHandle,
    vertex_shader: &crate::ShaderModuleHandle,
    fragment_shader: &crate::ShaderModuleHandle,
) -> Result<crate::GraphicsPipelineHandle> {
    // shader stages
    let stages = [
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(**vertex_shader)
            .name(SHADER_ENTRY_POINT)
            .build(),
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(**fragment_shader)
            .name(SHADER_ENTRY_POINT)
            .build(),
    ];

    // fixed function
    let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::builder();
    let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::builder()
        .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
        .primitive_restart_enable(false);
    let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
        .viewport_count(1)
        .scissor_count(1);
    let rasterization_state = rasterization_state();
    let multisample_state = vk::PipelineMultisampleStateCreateInfo::builder()
        .sample_shading_enable(false)
        .rasterization_samples(vk::SampleCountFlags::TYPE_1);
    let color_blend_attachments = [color_blend_attachment_state()];
    let color_blend_state = vk::PipelineColorBlendStateCreateInfo::builder()
        .logic_op_enable(false)
        .logic_op(vk::LogicOp::COPY)
        .attachments(&color_blend_attachments);
    let dynamic_state =
        vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&DYNAMIC_STATES);

    let graphics_pipeline_create_info = vk::GraphicsPipelineCreateInfo::builder()
        .stages(&stages)
        .vertex_input_state(&vertex_input_state)
        .input_assembly_state(&input_assembly_state)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization_state)
        .multisample_state(&multisample_state)
        .color_blend_state(&color_blend_state)
        .dynamic_state(&dynamic_state)
        .layout(**pipeline_layout)
        .render_pass(**render_pass)
        .subpass(0)
        .build();

    device.create_graphics_pipeline(pipeline_layout, render_pass, &graphics_pipeline_create_info)
}
