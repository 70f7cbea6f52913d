//! Compute-shader executor
//!
//! Every sub-step uploads the particles, dispatches `integrate.wgsl` and
//! blocks on the readback before returning, so sub-step `k + 1` always sees
//! the committed result of sub-step `k`.

use crate::error::GpuError;
use crate::params::SubStepParams;
use glam::Vec2;
use particle_physics::{error::Result, BatchExecutor, GpuParticle, SubStep};
use std::sync::mpsc;

const WORKGROUP_SIZE: u32 = 256;

/// Batch executor running the integration kernel on a wgpu device.
pub struct GpuExecutor {
    device: wgpu::Device,
    queue: wgpu::Queue,

    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,

    // Buffers
    params_buffer: wgpu::Buffer,
    particle_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,

    /// Particles the current buffers can hold
    capacity: usize,
    scratch: Vec<GpuParticle>,
    adapter_name: String,
}

impl GpuExecutor {
    /// Pick an adapter and create a device, blocking the calling thread.
    pub fn new() -> std::result::Result<Self, GpuError> {
        pollster::block_on(Self::new_async())
    }

    pub async fn new_async() -> std::result::Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        let adapter_name = adapter.get_info().name;
        log::info!("Using GPU for particle integration: {}", adapter_name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Particle Compute Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self::from_device(device, queue, adapter_name))
    }

    /// Build on an existing device, e.g. one shared with a renderer.
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        adapter_name: impl Into<String>,
    ) -> Self {
        log::debug!("Creating integration pipeline...");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Integration Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/integrate.wgsl").into()),
        });

        // 0: particles (storage, read/write)
        // 1: sub-step params (uniform)
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Integration Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Integration Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Integration Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sub-step Params Buffer"),
            size: std::mem::size_of::<SubStepParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Start with room for one workgroup; grown on first use
        let capacity = WORKGROUP_SIZE as usize;
        let (particle_buffer, staging_buffer) = create_particle_buffers(&device, capacity);
        let bind_group = create_bind_group(
            &device,
            &bind_group_layout,
            &particle_buffer,
            &params_buffer,
        );

        Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            params_buffer,
            particle_buffer,
            staging_buffer,
            bind_group,
            capacity,
            scratch: Vec::new(),
            adapter_name: adapter_name.into(),
        }
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Make sure the buffers hold at least `count` particles.
    fn reserve(&mut self, count: usize) -> std::result::Result<(), GpuError> {
        if count <= self.capacity {
            return Ok(());
        }

        let limits = self.device.limits();
        let bytes = (count * std::mem::size_of::<GpuParticle>()) as u64;
        let workgroups = count.div_ceil(WORKGROUP_SIZE as usize);
        if bytes > limits.max_storage_buffer_binding_size as u64
            || bytes > limits.max_buffer_size
            || workgroups > limits.max_compute_workgroups_per_dimension as usize
        {
            return Err(GpuError::TooManyParticles(count));
        }

        let capacity = count.next_power_of_two().min(
            limits.max_storage_buffer_binding_size as usize / std::mem::size_of::<GpuParticle>(),
        );
        let capacity = capacity.max(count);
        log::debug!(
            "Growing GPU particle buffers: {} -> {}",
            self.capacity,
            capacity
        );

        let (particle_buffer, staging_buffer) = create_particle_buffers(&self.device, capacity);
        self.bind_group = create_bind_group(
            &self.device,
            &self.bind_group_layout,
            &particle_buffer,
            &self.params_buffer,
        );
        self.particle_buffer = particle_buffer;
        self.staging_buffer = staging_buffer;
        self.capacity = capacity;
        Ok(())
    }

    fn run(
        &mut self,
        sub_step: &SubStep,
        positions: &mut [Vec2],
        velocities: &mut [Vec2],
    ) -> std::result::Result<(), GpuError> {
        let count = positions.len();
        self.reserve(count)?;

        self.scratch.clear();
        self.scratch.extend(
            positions
                .iter()
                .zip(velocities.iter())
                .map(|(&p, &v)| GpuParticle::new(p, v)),
        );

        let params = SubStepParams::new(sub_step, count as u32);
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[params]));
        self.queue
            .write_buffer(&self.particle_buffer, 0, bytemuck::cast_slice(&self.scratch));

        let byte_len = (count * std::mem::size_of::<GpuParticle>()) as u64;
        let workgroup_count = (count as u32).div_ceil(WORKGROUP_SIZE);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Integration Encoder"),
            });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Integration Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &self.bind_group, &[]);
            compute_pass.dispatch_workgroups(workgroup_count, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&self.particle_buffer, 0, &self.staging_buffer, 0, byte_len);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging_buffer.slice(..byte_len);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        {
            let data = slice.get_mapped_range();
            let bytes: &[u8] = &data;
            let results: &[GpuParticle] = bytemuck::cast_slice(bytes);
            for ((position, velocity), particle) in positions
                .iter_mut()
                .zip(velocities.iter_mut())
                .zip(results)
            {
                *position = particle.position();
                *velocity = particle.velocity();
            }
        }
        self.staging_buffer.unmap();

        Ok(())
    }
}

impl BatchExecutor for GpuExecutor {
    fn name(&self) -> &str {
        "gpu"
    }

    fn may_fail(&self) -> bool {
        true
    }

    fn execute(
        &mut self,
        sub_step: &SubStep,
        positions: &mut [Vec2],
        velocities: &mut [Vec2],
    ) -> Result<()> {
        if positions.is_empty() {
            return Ok(());
        }
        self.run(sub_step, positions, velocities)?;
        Ok(())
    }
}

fn create_particle_buffers(device: &wgpu::Device, capacity: usize) -> (wgpu::Buffer, wgpu::Buffer) {
    let size = (capacity * std::mem::size_of::<GpuParticle>()) as u64;

    let particle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Particle Buffer"),
        size,
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Particle Readback Buffer"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    (particle_buffer, staging_buffer)
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    particle_buffer: &wgpu::Buffer,
    params_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Integration Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: particle_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: params_buffer.as_entire_binding(),
            },
        ],
    })
}
