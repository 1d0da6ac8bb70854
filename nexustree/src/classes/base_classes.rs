nx_class! {
    /// Top of every NeXus file
    pub struct NxRoot: "NXroot" {
        fields {}
        attributes {
            file_name: NxChar => "file_name",
            file_time: NxDateTime => "file_time",
            file_update_time: NxDateTime => "file_update_time",
            creator: NxChar => "creator",
            nexus_version: NxChar => "NeXus_version",
            default: NxChar => "default",
        }
        groups {
            entry: NxEntry => "entry",
        }
    }
}

nx_class! {
    /// One measurement or simulation run
    pub struct NxEntry: "NXentry" {
        fields {
            title: NxChar => "title",
            experiment_identifier: NxChar => "experiment_identifier",
            experiment_description: NxChar => "experiment_description",
            entry_identifier: NxChar => "entry_identifier",
            /// Name of the application definition the entry follows
            definition: NxChar => "definition",
            start_time: NxDateTime => "start_time",
            end_time: NxDateTime => "end_time",
            duration: NxInt => "duration" units "NX_TIME",
            collection_time: NxFloat => "collection_time" units "NX_TIME",
            run_cycle: NxChar => "run_cycle",
            program_name: NxChar => "program_name",
            revision: NxChar => "revision",
            pre_sample_flightpath: NxFloat => "pre_sample_flightpath" units "NX_LENGTH",
        }
        attributes {
            default: NxChar => "default",
        }
        groups {
            data: NxData => "data",
            instrument: NxInstrument => "instrument",
            sample: NxSample => "sample",
            monitor: NxMonitor => "monitor",
            user: NxUser => "user",
            notes: NxNote => "notes",
            process: NxProcess => "process",
            collection: NxCollection => "collection",
        }
    }
}

nx_class! {
    pub struct NxInstrument: "NXinstrument" {
        fields {
            name: NxChar => "name",
        }
        attributes {}
        groups {
            source: NxSource => "source",
            monochromator: NxMonochromator => "monochromator",
            detector: NxDetector => "detector",
            beam: NxBeam => "beam",
            positioner: NxPositioner => "positioner",
            collection: NxCollection => "collection",
        }
    }
}

nx_class! {
    /// Radiation source: neutron, x-ray, muon, ...
    pub struct NxSource: "NXsource" {
        fields {
            name: NxChar => "name",
            source_type: NxChar => "type" one_of [
                "Spallation Neutron Source",
                "Pulsed Reactor Neutron Source",
                "Reactor Neutron Source",
                "Synchrotron X-ray Source",
                "Pulsed Muon Source",
                "Rotating Anode X-ray",
                "Fixed Tube X-ray",
                "UV Laser",
                "Free-Electron Laser",
                "Optical Laser",
                "Ion Source",
                "UV Plasma Source",
                "Metal Jet X-ray",
            ],
            probe: NxChar => "probe" one_of [
                "neutron",
                "x-ray",
                "muon",
                "electron",
                "ultraviolet",
                "visible light",
                "positron",
                "proton",
            ],
            power: NxFloat => "power" units "NX_POWER",
            energy: NxFloat => "energy" units "NX_ENERGY",
            current: NxFloat => "current" units "NX_CURRENT",
            voltage: NxFloat => "voltage" units "NX_VOLTAGE",
            frequency: NxFloat => "frequency" units "NX_FREQUENCY",
            period: NxFloat => "period" units "NX_PERIOD",
            target_material: NxChar => "target_material",
            mode: NxChar => "mode" one_of ["Single Bunch", "Multi Bunch"],
            top_up: NxBoolean => "top_up",
            distance: NxFloat => "distance" units "NX_LENGTH",
        }
        attributes {}
        groups {
            notes: NxNote => "notes",
        }
    }
}

nx_class! {
    pub struct NxMonochromator: "NXmonochromator" {
        fields {
            wavelength: NxFloat => "wavelength" units "NX_WAVELENGTH",
            wavelength_error: NxFloat => "wavelength_error" units "NX_WAVELENGTH",
            energy: NxFloat => "energy" units "NX_ENERGY",
            energy_error: NxFloat => "energy_error" units "NX_ENERGY",
            depends_on: NxChar => "depends_on",
        }
        attributes {}
        groups {
            transformations: NxTransformations => "transformations",
        }
    }
}

nx_class! {
    /// A detector, detector bank or multidetector
    pub struct NxDetector: "NXdetector" {
        fields {
            data: NxNumber => "data" units "NX_ANY",
            time_of_flight: NxFloat => "time_of_flight" units "NX_TIME_OF_FLIGHT",
            detector_number: NxInt => "detector_number",
            distance: NxFloat => "distance" units "NX_LENGTH",
            polar_angle: NxFloat => "polar_angle" units "NX_ANGLE",
            azimuthal_angle: NxFloat => "azimuthal_angle" units "NX_ANGLE",
            x_pixel_size: NxFloat => "x_pixel_size" units "NX_LENGTH",
            y_pixel_size: NxFloat => "y_pixel_size" units "NX_LENGTH",
            description: NxChar => "description",
            local_name: NxChar => "local_name",
            serial_number: NxChar => "serial_number",
            detector_type: NxChar => "type",
            layout: NxChar => "layout" one_of ["point", "linear", "area"],
            dead_time: NxFloat => "dead_time" units "NX_TIME",
            count_time: NxNumber => "count_time" units "NX_TIME",
            frame_start_number: NxInt => "frame_start_number",
            saturation_value: NxNumber => "saturation_value",
            sensor_material: NxChar => "sensor_material",
            sensor_thickness: NxFloat => "sensor_thickness" units "NX_LENGTH",
            acquisition_mode: NxChar => "acquisition_mode" one_of [
                "gated",
                "triggered",
                "summed",
                "event",
                "histogrammed",
                "decimated",
            ],
            depends_on: NxChar => "depends_on",
        }
        attributes {}
        groups {
            transformations: NxTransformations => "transformations",
            collection: NxCollection => "collection",
        }
    }
}

nx_class! {
    pub struct NxSample: "NXsample" {
        fields {
            name: NxChar => "name",
            chemical_formula: NxChar => "chemical_formula",
            description: NxChar => "description",
            short_title: NxChar => "short_title",
            sample_type: NxChar => "type" one_of [
                "sample",
                "sample+can",
                "can",
                "sample+buffer",
                "buffer",
                "calibration sample",
                "normalisation sample",
                "simulated data",
                "none",
                "sample environment",
            ],
            situation: NxChar => "situation" one_of [
                "air",
                "vacuum",
                "inert atmosphere",
                "oxidising atmosphere",
                "reducing atmosphere",
                "sealed can",
                "other",
            ],
            preparation_date: NxDateTime => "preparation_date",
            temperature: NxFloat => "temperature" units "NX_TEMPERATURE",
            electric_field: NxFloat => "electric_field" units "NX_VOLTAGE",
            magnetic_field: NxFloat => "magnetic_field" units "NX_ANY",
            pressure: NxFloat => "pressure" units "NX_PRESSURE",
            changer_position: NxInt => "changer_position",
            unit_cell: NxFloat => "unit_cell" units "NX_LENGTH",
            unit_cell_volume: NxFloat => "unit_cell_volume" units "NX_VOLUME",
            orientation_matrix: NxFloat => "orientation_matrix",
            mass: NxFloat => "mass" units "NX_MASS",
            density: NxFloat => "density" units "NX_MASS_DENSITY",
            relative_molecular_mass: NxFloat => "relative_molecular_mass" units "NX_MASS",
            concentration: NxFloat => "concentration" units "NX_MASS_DENSITY",
            volume_fraction: NxFloat => "volume_fraction",
            path_length: NxFloat => "path_length" units "NX_LENGTH",
            thickness: NxFloat => "thickness" units "NX_LENGTH",
            rotation_angle: NxFloat => "rotation_angle" units "NX_ANGLE",
            x_translation: NxFloat => "x_translation" units "NX_LENGTH",
            depends_on: NxChar => "depends_on",
        }
        attributes {}
        groups {
            beam: NxBeam => "beam",
            positioner: NxPositioner => "positioner",
            transformations: NxTransformations => "transformations",
        }
    }
}

nx_class! {
    /// Properties of the beam at a given location
    pub struct NxBeam: "NXbeam" {
        fields {
            incident_energy: NxFloat => "incident_energy" units "NX_ENERGY",
            final_energy: NxFloat => "final_energy" units "NX_ENERGY",
            energy_transfer: NxFloat => "energy_transfer" units "NX_ENERGY",
            incident_wavelength: NxFloat => "incident_wavelength" units "NX_WAVELENGTH",
            incident_wavelength_spread: NxFloat => "incident_wavelength_spread" units "NX_WAVELENGTH",
            incident_beam_divergence: NxFloat => "incident_beam_divergence" units "NX_ANGLE",
            incident_polarization: NxNumber => "incident_polarization" units "NX_ANY",
            flux: NxFloat => "flux" units "NX_FLUX",
            distance: NxFloat => "distance" units "NX_LENGTH",
            depends_on: NxChar => "depends_on",
        }
        attributes {}
        groups {}
    }
}

nx_class! {
    /// Plottable data: a signal and its axes
    pub struct NxData: "NXdata" {
        fields {
            data: NxNumber => "data",
            errors: NxNumber => "errors",
            x: NxNumber => "x",
            y: NxNumber => "y",
            z: NxNumber => "z",
            title: NxChar => "title",
        }
        attributes {
            signal: NxChar => "signal",
            axes: NxChar => "axes",
            interpretation: NxChar => "interpretation" one_of [
                "scalar",
                "scaler",
                "spectrum",
                "image",
                "rgba-image",
                "hsla-image",
                "cmyk-image",
                "vertex",
            ],
        }
        groups {}
    }
}

nx_class! {
    pub struct NxMonitor: "NXmonitor" {
        fields {
            mode: NxChar => "mode" one_of ["monitor", "timer"],
            start_time: NxDateTime => "start_time",
            end_time: NxDateTime => "end_time",
            preset: NxNumber => "preset" units "NX_ANY",
            distance: NxFloat => "distance" units "NX_LENGTH",
            nominal: NxNumber => "nominal" units "NX_ANY",
            integral: NxNumber => "integral" units "NX_ANY",
            data: NxNumber => "data" units "NX_ANY",
            sampled_fraction: NxFloat => "sampled_fraction" units "NX_DIMENSIONLESS",
            count_time: NxFloat => "count_time" units "NX_TIME",
            efficiency: NxNumber => "efficiency" units "NX_DIMENSIONLESS",
            time_of_flight: NxFloat => "time_of_flight" units "NX_TIME_OF_FLIGHT",
            monitor_type: NxChar => "type",
        }
        attributes {}
        groups {}
    }
}

nx_class! {
    /// Contact details of a person involved in the experiment
    pub struct NxUser: "NXuser" {
        fields {
            name: NxChar => "name",
            role: NxChar => "role",
            affiliation: NxChar => "affiliation",
            address: NxChar => "address",
            telephone_number: NxChar => "telephone_number",
            fax_number: NxChar => "fax_number",
            email: NxChar => "email",
            facility_user_id: NxChar => "facility_user_id",
            orcid: NxChar => "ORCID",
        }
        attributes {}
        groups {}
    }
}

nx_class! {
    pub struct NxNote: "NXnote" {
        fields {
            author: NxChar => "author",
            date: NxDateTime => "date",
            note_type: NxChar => "type",
            file_name: NxChar => "file_name",
            description: NxChar => "description",
            sequence_index: NxPosint => "sequence_index",
            data: NxChar => "data",
        }
        attributes {}
        groups {}
    }
}

nx_class! {
    /// A motor or other positioning device
    pub struct NxPositioner: "NXpositioner" {
        fields {
            name: NxChar => "name",
            description: NxChar => "description",
            position: NxNumber => "value" units "NX_ANY",
            raw_value: NxNumber => "raw_value" units "NX_ANY",
            target_value: NxNumber => "target_value" units "NX_ANY",
            tolerance: NxNumber => "tolerance" units "NX_ANY",
            soft_limit_min: NxNumber => "soft_limit_min" units "NX_ANY",
            soft_limit_max: NxNumber => "soft_limit_max" units "NX_ANY",
            velocity: NxNumber => "velocity" units "NX_ANY",
            acceleration_time: NxNumber => "acceleration_time" units "NX_TIME",
            controller_record: NxChar => "controller_record",
            depends_on: NxChar => "depends_on",
        }
        attributes {}
        groups {}
    }
}

nx_class! {
    /// A processing or analysis step applied to the data
    pub struct NxProcess: "NXprocess" {
        fields {
            program: NxChar => "program",
            sequence_index: NxPosint => "sequence_index",
            version: NxChar => "version",
            date: NxDateTime => "date",
        }
        attributes {}
        groups {
            notes: NxNote => "notes",
            data: NxData => "data",
        }
    }
}

nx_class! {
    /// Axis fields describing a chain of translations and rotations
    pub struct NxTransformations: "NXtransformations" {
        fields {}
        attributes {
            default: NxChar => "default",
        }
        groups {}
    }
}

nx_class! {
    /// Unvalidated container for anything else
    pub struct NxCollection: "NXcollection" {
        fields {}
        attributes {}
        groups {}
    }
}
