use std::time::Instant;

use super::job_stage::JobStage;
use super::morph_settings::MorphSettings;
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger, AUDIO_SECONDS_METRIC};
use crate::codec::domain::codec_error::CodecError;
use crate::codec::infrastructure::opus_decoder::OpusPacketDecoder;
use crate::codec::infrastructure::opus_encoder::OpusPacketEncoder;
use crate::container::domain::opus_header::{OpusHead, OpusTags};
use crate::container::infrastructure::ogg_demuxer::{demux, DemuxedStream};
use crate::container::infrastructure::ogg_muxer::OggMuxer;
use crate::effects::domain::effect_error::EffectError;
use crate::effects::domain::morph_preset::{MorphPreset, PresetParams};
use crate::effects::infrastructure::effect_engine::{apply, apply_character};
use crate::shared::constants::VENDOR_STRING;
use crate::shared::error::MorphError;
use crate::shared::pcm_buffer::PcmBuffer;

/// One morph of one recording, from input bytes to output bytes.
///
/// Runs demux, decode, effects, encode and mux strictly in sequence. The
/// first error ends the job in `Failed`; nothing partial is returned.
pub struct TranscodeJob {
    input: Vec<u8>,
    preset: MorphPreset,
    params: &'static PresetParams,
    settings: MorphSettings,
    stage: JobStage,
    logger: Box<dyn PipelineLogger>,
}

impl TranscodeJob {
    pub fn new(input: Vec<u8>, preset: MorphPreset, settings: MorphSettings) -> Self {
        Self {
            input,
            preset,
            params: preset.params(),
            settings,
            stage: JobStage::Created,
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn stage(&self) -> JobStage {
        self.stage
    }

    pub fn preset(&self) -> MorphPreset {
        self.preset
    }

    /// Run the job to completion.
    ///
    /// `Disabled` returns the input untouched without parsing it.
    pub fn run(mut self) -> Result<Vec<u8>, MorphError> {
        if self.preset == MorphPreset::Disabled {
            self.logger.info("Preset disabled, passing input through");
            self.advance(JobStage::Completed);
            return Ok(std::mem::take(&mut self.input));
        }

        let started = Instant::now();
        match self.execute() {
            Ok(output) => {
                self.advance(JobStage::Completed);
                self.logger.info(&format!(
                    "Morphed with preset '{}' in {:.2}s ({} -> {} bytes)",
                    self.preset,
                    started.elapsed().as_secs_f64(),
                    self.input.len(),
                    output.len()
                ));
                self.logger.summary();
                Ok(output)
            }
            Err(err) => {
                log::warn!("Morph job failed during {}: {err}", self.stage);
                self.advance(JobStage::Failed);
                Err(err)
            }
        }
    }

    fn execute(&mut self) -> Result<Vec<u8>, MorphError> {
        let input = std::mem::take(&mut self.input);
        let result = self.transcode(&input);
        self.input = input;
        result
    }

    fn transcode(&mut self, input: &[u8]) -> Result<Vec<u8>, MorphError> {
        let DemuxedStream {
            header,
            tags,
            serial,
            packets,
        } = self.timed(JobStage::Demuxing, || demux(input))?;
        self.logger.metric("input_channels", f64::from(header.channels));

        let decoded = self.timed(JobStage::Decoding, || -> Result<PcmBuffer, MorphError> {
            OpusPacketDecoder::new(&header)?.decode(packets)
        })?;
        self.logger.metric("input_frames", decoded.frames() as f64);
        self.logger.metric(AUDIO_SECONDS_METRIC, decoded.duration());

        let params = *self.params;
        let morphed = self.timed(JobStage::EffectProcessing, || -> Result<PcmBuffer, EffectError> {
            let shifted = apply(decoded, params.pitch_semitones, params.rate)?;
            apply_character(shifted, &params.character)
        })?;
        self.logger.metric("output_frames", morphed.frames() as f64);

        let encoder = OpusPacketEncoder::new(self.settings.encoder);
        let encoded = self.timed(JobStage::Encoding, || encoder.encode(&morphed))?;
        self.logger.metric("output_packets", encoded.packets.len() as f64);

        let output_channels = u8::try_from(encoded.channels).map_err(|_| {
            CodecError::EncodeFailure(format!("{} channels", encoded.channels))
        })?;
        let output_header = OpusHead::new(output_channels, encoded.pre_skip, header.input_sample_rate);
        let output_tags = OpusTags {
            vendor: VENDOR_STRING.to_string(),
            comments: tags.comments,
        };
        let bytes = self.timed(JobStage::Muxing, || {
            OggMuxer::new(serial).mux(&encoded.packets, &output_header, &output_tags)
        });
        Ok(bytes)
    }

    fn timed<T>(&mut self, stage: JobStage, work: impl FnOnce() -> T) -> T {
        self.advance(stage);
        let start = Instant::now();
        let result = work();
        self.logger
            .timing(stage.name(), start.elapsed().as_secs_f64() * 1000.0);
        result
    }

    fn advance(&mut self, stage: JobStage) {
        self.stage = stage;
        self.logger.stage(stage);
    }
}
